//! Core configuration for avatar-animation-core.

use serde::{Deserialize, Serialize};

use crate::fade::Easing;

/// Sizing hints and defaults for a [`crate::LayerManager`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial capacity hints for the layer map and pose buffers.
    pub expected_layers: usize,
    pub expected_targets: usize,

    /// Maximum events retained per update before older ones are dropped.
    pub max_events_per_tick: usize,

    /// Easing used by `play_animation` crossfades when none is given.
    pub default_easing: Easing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expected_layers: 16,
            expected_targets: 256,
            max_events_per_tick: 1024,
            default_easing: Easing::Linear,
        }
    }
}
