use std::sync::Arc;

use avatar_api_core::Value;

use crate::clip_player::{ClipPlayer, ClipProgress};
use crate::data::AnimationClip;

use super::StateProgress;

#[derive(Clone, Debug)]
pub struct SingleState {
    player: ClipPlayer,
    loop_count: Option<u32>,
}

impl SingleState {
    pub fn new(clip: Arc<AnimationClip>, loop_count: Option<u32>) -> Self {
        Self {
            player: ClipPlayer::new(clip, loop_count),
            loop_count,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        self.player.clip()
    }

    pub(crate) fn restart(&mut self, loop_count: Option<u32>) {
        self.player.restart(loop_count.or(self.loop_count));
    }

    pub(crate) fn advance(&mut self, dt: f32) -> StateProgress {
        match self.player.advance(dt) {
            ClipProgress::Running => StateProgress::Running,
            ClipProgress::Looped => StateProgress::Looped,
            ClipProgress::Finished => StateProgress::Completed,
        }
    }

    pub(crate) fn sample(&self, emit: &mut dyn FnMut(&str, Value, f32)) {
        self.player.sample(&mut |target, value| emit(target, value, 1.0));
    }
}
