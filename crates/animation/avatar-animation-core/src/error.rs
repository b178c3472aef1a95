//! Error types for layer and animation management

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of animation state kinds a layer can hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    Single,
    Queue,
    Random,
    FreeBlend,
    Blend2d,
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnimationKind::Single => "single",
            AnimationKind::Queue => "queue",
            AnimationKind::Random => "random",
            AnimationKind::FreeBlend => "free blend",
            AnimationKind::Blend2d => "blend 2d",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    /// A layer with this name is already registered
    #[error("Layer already exists: {layer}")]
    DuplicateLayer { layer: String },

    #[error("Layer not found: {layer}")]
    UnknownLayer { layer: String },

    #[error("Animation not found: {animation} on layer {layer}")]
    UnknownAnimation { layer: String, animation: String },

    #[error("Animation already exists: {animation} on layer {layer}")]
    DuplicateAnimation { layer: String, animation: String },

    /// Configuration rejected by `add_animation`
    #[error("Invalid {kind} animation {animation}: {reason}")]
    InvalidAnimationConfig {
        animation: String,
        kind: AnimationKind,
        reason: String,
    },

    #[error("Blend option not found: {option} in animation {animation}")]
    UnknownBlendOption { animation: String, option: String },

    /// Operation only valid for another animation kind
    #[error("{operation} is not supported by {kind} animation {animation}")]
    UnsupportedOperation {
        animation: String,
        kind: AnimationKind,
        operation: &'static str,
    },

    #[error("Invalid clip {clip}: {reason}")]
    InvalidClip { clip: String, reason: String },

    #[error("Clip JSON could not be parsed: {reason}")]
    ClipJson { reason: String },
}
