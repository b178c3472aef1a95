//! Typed events a [`crate::HostController`] reports per frame.

use avatar_animation_core::AnimationEvent;
use avatar_speech_core::{AudioError, SynthesisError, Viseme};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum HostEvent {
    /// Audio started and the utterance's timeline is live.
    SpeechPlay { utterance: Uuid },
    SpeechPause { utterance: Uuid },
    SpeechResume { utterance: Uuid },
    /// Stopped by the caller or superseded by a new utterance.
    SpeechStop { utterance: Uuid },
    /// Audio played to the end.
    SpeechEnd { utterance: Uuid },
    SynthesisFailed {
        utterance: Uuid,
        error: SynthesisError,
    },
    AudioFailed { utterance: Uuid, error: AudioError },

    Sentence {
        utterance: Uuid,
        text: String,
        time_ms: f64,
    },
    Word {
        utterance: Uuid,
        text: String,
        time_ms: f64,
    },
    Viseme {
        utterance: Uuid,
        viseme: Viseme,
        time_ms: f64,
        duration_ms: f64,
    },
    /// SSML bookmark reached. Command marks are executed as well.
    Ssml {
        utterance: Uuid,
        value: String,
        time_ms: f64,
    },
    MarkCommandFailed { value: String, reason: String },

    /// Gesture request dropped because its layer played one too recently.
    GestureThrottled { layer: String, animation: String },

    Animation(AnimationEvent),
}

impl HostEvent {
    pub fn utterance(&self) -> Option<Uuid> {
        match self {
            HostEvent::SpeechPlay { utterance }
            | HostEvent::SpeechPause { utterance }
            | HostEvent::SpeechResume { utterance }
            | HostEvent::SpeechStop { utterance }
            | HostEvent::SpeechEnd { utterance }
            | HostEvent::SynthesisFailed { utterance, .. }
            | HostEvent::AudioFailed { utterance, .. }
            | HostEvent::Sentence { utterance, .. }
            | HostEvent::Word { utterance, .. }
            | HostEvent::Viseme { utterance, .. }
            | HostEvent::Ssml { utterance, .. } => Some(*utterance),
            _ => None,
        }
    }
}
