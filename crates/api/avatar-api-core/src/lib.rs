//! avatar-api-core: values, poses and blending math (engine-agnostic)

pub mod blend;
pub mod pose;
pub mod value;

pub use pose::{Pose, PoseSink};
pub use value::{Value, ValueKind};
