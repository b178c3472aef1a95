//! Host error type

use avatar_animation_core::AnimationError;
use avatar_speech_core::SpeechError;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum HostError {
    #[error(transparent)]
    Animation(#[from] AnimationError),

    #[error(transparent)]
    Speech(#[from] SpeechError),

    /// A clip or config the rig setup needs was not provided
    #[error("Missing {kind} asset '{name}'")]
    MissingAsset { kind: &'static str, name: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Feature '{feature}' is not attached")]
    FeatureMissing { feature: &'static str },

    #[error("Invalid mark command '{mark}': {reason}")]
    MarkCommand { mark: String, reason: String },
}

impl HostError {
    pub(crate) fn missing_clip(name: &str) -> Self {
        HostError::MissingAsset {
            kind: "clip",
            name: name.to_string(),
        }
    }
}
