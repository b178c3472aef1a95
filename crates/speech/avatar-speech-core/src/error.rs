//! Error types for speech synthesis, timelines and audio playback

use crate::speechmark::MarkType;

/// Failure of one synthesis request. Cloneable so every holder of a shared
/// synthesis future observes the same error.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SynthesisError {
    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    /// Provider accepted the request but reported a failure
    #[error("Provider error{}: {reason}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Provider { code: Option<String>, reason: String },

    /// Response could not be decoded into audio and timing events
    #[error("Invalid provider response: {reason}")]
    InvalidResponse { reason: String },
}

impl SynthesisError {
    /// Whether a retry with the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SynthesisError::Network { .. } | SynthesisError::Provider { .. }
        )
    }
}

/// A raw timing event that could not be placed on a timeline. Recovered
/// locally: the mark is dropped (or replaced) and the issue logged.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TimelineInconsistency {
    #[error("{mark_type} mark has invalid time {time_ms}")]
    InvalidTime { mark_type: MarkType, time_ms: f64 },

    #[error("unknown provider viseme id {id} at {time_ms}ms")]
    UnknownVisemeId { id: u32, time_ms: f64 },

    #[error("unknown viseme code '{code}' at {time_ms}ms")]
    UnknownVisemeCode { code: String, time_ms: f64 },

    /// Same-type mark at an identical time; the later delivery wins
    #[error("{mark_type} mark at {time_ms}ms replaced by a later duplicate")]
    Collapsed { mark_type: MarkType, time_ms: f64 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AudioError {
    #[error("Audio could not be loaded: {reason}")]
    Load { reason: String },

    #[error("Audio playback failed: {reason}")]
    Playback { reason: String },

    #[error("No audio loaded")]
    NotLoaded,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SpeechError {
    #[error("Unknown viseme code: {code}")]
    UnknownViseme { code: String },

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Timeline(#[from] TimelineInconsistency),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(SynthesisError::Network { reason: "reset".into() }.is_retryable());
        assert!(!SynthesisError::Auth { reason: "expired".into() }.is_retryable());
        let provider = SynthesisError::Provider {
            code: Some("429".into()),
            reason: "throttled".into(),
        };
        assert_eq!(provider.to_string(), "Provider error (429): throttled");
    }
}
