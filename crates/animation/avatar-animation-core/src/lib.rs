//! Avatar Animation Core (engine-agnostic)
//!
//! Layered animation playback: clips are sampled by animation states
//! (single, queue, random, free blend, 2D blend), states live on weighted
//! layers, and [`LayerManager`] composes every layer into a [`Pose`] each frame.

pub mod accumulate;
pub mod clip_player;
pub mod config;
pub mod data;
pub mod error;
pub mod fade;
pub mod ids;
pub mod interp;
pub mod layer;
pub mod manager;
pub mod outputs;
pub mod sampling;
pub mod state;
pub mod stored_animation;

// Re-exports for consumers (host, tests)
pub use config::Config;
pub use data::{AnimationClip, Keypoint, Track, Transitions, Vec2};
pub use error::{AnimationError, AnimationKind};
pub use fade::{Easing, WeightFade};
pub use ids::LayerId;
pub use layer::{AnimationLayer, BlendMode, LayerConfig, LayerStatus, PlayOptions};
pub use manager::LayerManager;
pub use outputs::AnimationEvent;
pub use sampling::sample_track;
pub use state::{
    AnimationConfig, AnimationState, Blend2dOption, BlendOption, QueueEntry, StateProgress,
};
pub use stored_animation::parse_clip_json;
pub use avatar_api_core::{Pose, PoseSink, Value, ValueKind};
