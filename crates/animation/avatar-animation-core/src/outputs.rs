//! Discrete semantic signals emitted while layers update.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationEvent {
    Started {
        layer: String,
        animation: String,
    },
    /// The active animation was replaced or stopped before completing.
    Interrupted {
        layer: String,
        animation: String,
    },
    Looped {
        layer: String,
        animation: String,
    },
    /// A finite animation played its last loop and holds its final frame.
    Completed {
        layer: String,
        animation: String,
    },
    QueueAdvanced {
        layer: String,
        animation: String,
        index: usize,
        clip: String,
    },
    RandomPicked {
        layer: String,
        animation: String,
        clip: String,
    },
}

impl AnimationEvent {
    pub fn layer(&self) -> &str {
        match self {
            AnimationEvent::Started { layer, .. }
            | AnimationEvent::Interrupted { layer, .. }
            | AnimationEvent::Looped { layer, .. }
            | AnimationEvent::Completed { layer, .. }
            | AnimationEvent::QueueAdvanced { layer, .. }
            | AnimationEvent::RandomPicked { layer, .. } => layer,
        }
    }

    pub fn animation(&self) -> &str {
        match self {
            AnimationEvent::Started { animation, .. }
            | AnimationEvent::Interrupted { animation, .. }
            | AnimationEvent::Looped { animation, .. }
            | AnimationEvent::Completed { animation, .. }
            | AnimationEvent::QueueAdvanced { animation, .. }
            | AnimationEvent::RandomPicked { animation, .. } => animation,
        }
    }
}
