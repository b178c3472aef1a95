use std::sync::Arc;

use avatar_api_core::Value;
use indexmap::IndexMap;

use crate::clip_player::ClipPlayer;
use crate::data::AnimationClip;
use crate::fade::{Easing, WeightFade};

use super::StateProgress;

#[derive(Clone, Debug)]
pub struct BlendOption {
    pub name: String,
    pub clip: Arc<AnimationClip>,
    /// Initial weight in [0,1].
    pub weight: f32,
}

impl BlendOption {
    pub fn new(name: impl Into<String>, clip: Arc<AnimationClip>, weight: f32) -> Self {
        Self {
            name: name.into(),
            clip,
            weight,
        }
    }
}

#[derive(Clone, Debug)]
struct Channel {
    player: ClipPlayer,
    weight: WeightFade,
}

/// Every option loops concurrently; weights are driven from outside and are
/// independent of each other (they need not sum to 1).
#[derive(Clone, Debug)]
pub struct FreeBlendState {
    channels: IndexMap<String, Channel>,
}

impl FreeBlendState {
    pub(crate) fn new(options: Vec<BlendOption>) -> Self {
        let channels = options
            .into_iter()
            .map(|o| {
                (
                    o.name,
                    Channel {
                        player: ClipPlayer::new(o.clip, None),
                        weight: WeightFade::new(o.weight),
                    },
                )
            })
            .collect();
        Self { channels }
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn weight(&self, option: &str) -> Option<f32> {
        self.channels.get(option).map(|c| c.weight.value())
    }

    pub fn target_weight(&self, option: &str) -> Option<f32> {
        self.channels.get(option).map(|c| c.weight.target())
    }

    /// Returns false when `option` does not exist.
    pub(crate) fn set_weight(
        &mut self,
        option: &str,
        weight: f32,
        fade: Option<f32>,
        easing: Easing,
    ) -> bool {
        match self.channels.get_mut(option) {
            Some(channel) => {
                channel.weight.set(weight, fade, easing);
                true
            }
            None => false,
        }
    }

    /// Rewinds the players; externally driven weights are kept.
    pub(crate) fn restart(&mut self) {
        for channel in self.channels.values_mut() {
            channel.player.restart(None);
        }
    }

    pub(crate) fn advance(&mut self, dt: f32) -> StateProgress {
        for channel in self.channels.values_mut() {
            channel.weight.advance(dt);
            channel.player.advance(dt);
        }
        StateProgress::Running
    }

    pub(crate) fn sample(&self, emit: &mut dyn FnMut(&str, Value, f32)) {
        for channel in self.channels.values() {
            let w = channel.weight.value();
            if w > 0.0 {
                channel
                    .player
                    .sample(&mut |target, value| emit(target, value, w));
            }
        }
    }

    pub(crate) fn cancel_fades(&mut self) {
        for channel in self.channels.values_mut() {
            channel.weight.halt();
        }
    }
}
