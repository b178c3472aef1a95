use std::sync::Arc;

use avatar_api_core::Value;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clip_player::{ClipPlayer, ClipProgress};
use crate::data::AnimationClip;

use super::{StateNote, StateProgress};

/// Idle-style randomness: wait, play one option once, wait again.
/// Never completes on its own.
#[derive(Clone, Debug)]
pub struct RandomState {
    options: Vec<Arc<AnimationClip>>,
    play_interval: f32,
    rng: StdRng,
    seed: Option<u64>,
    last_pick: Option<usize>,
    waited: f32,
    current: Option<ClipPlayer>,
}

impl RandomState {
    pub(crate) fn new(options: Vec<Arc<AnimationClip>>, play_interval: f32, seed: Option<u64>) -> Self {
        Self {
            options,
            play_interval,
            rng: make_rng(seed),
            seed,
            last_pick: None,
            waited: 0.0,
            current: None,
        }
    }

    pub fn last_pick(&self) -> Option<&str> {
        self.last_pick.map(|i| self.options[i].name.as_str())
    }

    pub fn is_playing_option(&self) -> bool {
        self.current.is_some()
    }

    pub(crate) fn restart(&mut self) {
        self.rng = make_rng(self.seed);
        self.last_pick = None;
        self.waited = 0.0;
        self.current = None;
    }

    fn pick(&mut self) -> usize {
        let n = self.options.len();
        match (n, self.last_pick) {
            (1, _) => 0,
            (_, None) => self.rng.gen_range(0..n),
            // Draw from the n-1 other options, skipping over the last pick.
            (_, Some(last)) => {
                let i = self.rng.gen_range(0..n - 1);
                if i >= last {
                    i + 1
                } else {
                    i
                }
            }
        }
    }

    pub(crate) fn advance(&mut self, dt: f32, notes: &mut Vec<StateNote>) -> StateProgress {
        let mut remaining = dt.max(0.0);
        loop {
            if let Some(player) = &mut self.current {
                match player.advance(remaining) {
                    ClipProgress::Finished => {
                        remaining = player.overflow();
                        self.current = None;
                        self.waited = 0.0;
                    }
                    _ => return StateProgress::Running,
                }
            }
            let wait_left = self.play_interval - self.waited;
            if remaining < wait_left {
                self.waited += remaining;
                return StateProgress::Running;
            }
            remaining -= wait_left.max(0.0);
            let idx = self.pick();
            self.last_pick = Some(idx);
            let clip = self.options[idx].clone();
            debug!("random pick {}", clip.name);
            notes.push(StateNote::RandomPicked {
                clip: clip.name.clone(),
            });
            self.current = Some(ClipPlayer::new(clip, Some(1)));
            if remaining <= 0.0 {
                return StateProgress::Running;
            }
        }
    }

    pub(crate) fn sample(&self, emit: &mut dyn FnMut(&str, Value, f32)) {
        if let Some(player) = &self.current {
            player.sample(&mut |target, value| emit(target, value, 1.0));
        }
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
