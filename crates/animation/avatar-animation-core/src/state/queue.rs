use std::sync::Arc;

use avatar_api_core::Value;
use log::debug;

use crate::clip_player::{ClipPlayer, ClipProgress};
use crate::data::AnimationClip;
use crate::fade::{Easing, WeightFade};

use super::{StateNote, StateProgress};

#[derive(Clone, Debug)]
pub struct QueueEntry {
    pub clip: Arc<AnimationClip>,
    /// `None` repeats this entry forever and the queue never advances past it.
    pub loop_count: Option<u32>,
}

impl QueueEntry {
    /// Entry played once.
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            loop_count: Some(1),
        }
    }
}

#[derive(Clone, Debug)]
struct Outgoing {
    player: ClipPlayer,
    fade: WeightFade,
}

/// Sequential playback with crossfades at entry boundaries.
#[derive(Clone, Debug)]
pub struct QueueState {
    entries: Vec<QueueEntry>,
    transition_between: f32,
    index: usize,
    current: ClipPlayer,
    current_fade: WeightFade,
    /// Finished entry fading out under the next one.
    outgoing: Option<Outgoing>,
    completed: bool,
}

impl QueueState {
    pub(crate) fn new(entries: Vec<QueueEntry>, transition_between: f32) -> Self {
        let first = &entries[0];
        let current = ClipPlayer::new(first.clip.clone(), first.loop_count);
        Self {
            entries,
            transition_between,
            index: 0,
            current,
            current_fade: WeightFade::new(1.0),
            outgoing: None,
            completed: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_clip(&self) -> &str {
        &self.current.clip().name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn restart(&mut self) {
        self.index = 0;
        let first = &self.entries[0];
        self.current = ClipPlayer::new(first.clip.clone(), first.loop_count);
        self.current_fade = WeightFade::new(1.0);
        self.outgoing = None;
        self.completed = false;
    }

    pub(crate) fn advance(&mut self, dt: f32, notes: &mut Vec<StateNote>) -> StateProgress {
        if let Some(out) = &mut self.outgoing {
            out.player.advance(dt);
            if out.fade.advance(dt) <= 0.0 {
                self.outgoing = None;
            }
        }
        self.current_fade.advance(dt);
        if self.completed {
            return StateProgress::Completed;
        }

        let mut step = dt;
        loop {
            match self.current.advance(step) {
                ClipProgress::Running => return StateProgress::Running,
                ClipProgress::Looped => return StateProgress::Looped,
                ClipProgress::Finished if self.index + 1 >= self.entries.len() => {
                    self.completed = true;
                    return StateProgress::Completed;
                }
                ClipProgress::Finished => {
                    step = self.current.overflow();
                    self.begin_next();
                    notes.push(StateNote::QueueAdvanced {
                        index: self.index,
                        clip: self.current.clip().name.clone(),
                    });
                }
            }
        }
    }

    fn begin_next(&mut self) {
        self.index += 1;
        let entry = &self.entries[self.index];
        let next = ClipPlayer::new(entry.clip.clone(), entry.loop_count);
        let finished = std::mem::replace(&mut self.current, next);
        debug!(
            "queue advanced to {} ({}/{})",
            entry.clip.name,
            self.index + 1,
            self.entries.len()
        );
        if self.transition_between > 0.0 {
            let mut fade = WeightFade::new(self.current_fade.value());
            fade.set(0.0, Some(self.transition_between), Easing::Linear);
            self.outgoing = Some(Outgoing {
                player: finished,
                fade,
            });
            self.current_fade = WeightFade::new(0.0);
            self.current_fade
                .set(1.0, Some(self.transition_between), Easing::Linear);
        } else {
            self.outgoing = None;
            self.current_fade = WeightFade::new(1.0);
        }
    }

    pub(crate) fn sample(&self, emit: &mut dyn FnMut(&str, Value, f32)) {
        if let Some(out) = &self.outgoing {
            let w = out.fade.value();
            if w > 0.0 {
                out.player.sample(&mut |target, value| emit(target, value, w));
            }
        }
        let w = self.current_fade.value();
        if w > 0.0 {
            self.current
                .sample(&mut |target, value| emit(target, value, w));
        }
    }

    pub(crate) fn cancel_fades(&mut self) {
        self.current_fade.halt();
        if let Some(out) = &mut self.outgoing {
            out.fade.halt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Keypoint, Track, Transitions};

    fn flat(name: &str, value: f32, duration_ms: u32) -> Arc<AnimationClip> {
        Arc::new(AnimationClip {
            name: name.into(),
            duration_ms,
            tracks: vec![Track {
                id: "t".into(),
                name: "t".into(),
                target: "x".into(),
                points: vec![Keypoint {
                    id: "k".into(),
                    stamp: 0.0,
                    value: Value::Float(value),
                    transitions: Some(Transitions::linear()),
                }],
            }],
        })
    }

    fn sampled(q: &QueueState) -> Vec<(f32, f32)> {
        let mut out = Vec::new();
        q.sample(&mut |_, v, w| out.push((v.as_float().unwrap(), w)));
        out
    }

    #[test]
    fn advances_and_carries_overflow() {
        let mut q = QueueState::new(
            vec![
                QueueEntry::new(flat("a", 1.0, 1000)),
                QueueEntry::new(flat("b", 2.0, 1000)),
            ],
            0.0,
        );
        let mut notes = Vec::new();
        assert_eq!(q.advance(0.9, &mut notes), StateProgress::Running);
        assert_eq!(sampled(&q), vec![(1.0, 1.0)]);
        assert_eq!(q.advance(0.3, &mut notes), StateProgress::Running);
        assert_eq!(
            notes,
            vec![StateNote::QueueAdvanced {
                index: 1,
                clip: "b".into()
            }]
        );
        assert!((q.current.time() - 0.2).abs() < 1e-4);
        assert_eq!(sampled(&q), vec![(2.0, 1.0)]);
        assert_eq!(q.advance(1.0, &mut notes), StateProgress::Completed);
        assert_eq!(sampled(&q), vec![(2.0, 1.0)]);
    }

    #[test]
    fn crossfades_between_entries() {
        let mut q = QueueState::new(
            vec![
                QueueEntry::new(flat("a", 1.0, 500)),
                QueueEntry::new(flat("b", 2.0, 500)),
            ],
            0.2,
        );
        let mut notes = Vec::new();
        q.advance(0.5, &mut notes);
        q.advance(0.1, &mut notes);
        let s = sampled(&q);
        assert_eq!(s.len(), 2);
        let total: f32 = s.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-4);
        q.advance(0.15, &mut notes);
        assert_eq!(sampled(&q), vec![(2.0, 1.0)]);
    }
}
