//! Playhead over one clip: local time, loop counting, sampling.

use std::sync::Arc;

use avatar_api_core::Value;

use crate::data::AnimationClip;
use crate::sampling::sample_track;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClipProgress {
    Running,
    /// Wrapped around at least once this step.
    Looped,
    /// Played its last loop; the playhead holds the final frame.
    Finished,
}

#[derive(Clone, Debug)]
pub struct ClipPlayer {
    clip: Arc<AnimationClip>,
    time: f32,
    /// `None` loops forever.
    loop_count: Option<u32>,
    loops_done: u32,
    finished: bool,
    /// Time past the end of the final loop on the finishing step.
    overflow: f32,
}

impl ClipPlayer {
    pub fn new(clip: Arc<AnimationClip>, loop_count: Option<u32>) -> Self {
        Self {
            clip,
            time: 0.0,
            loop_count,
            loops_done: 0,
            finished: false,
            overflow: 0.0,
        }
    }

    #[inline]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn overflow(&self) -> f32 {
        self.overflow
    }

    pub fn restart(&mut self, loop_count: Option<u32>) {
        self.time = 0.0;
        self.loop_count = loop_count;
        self.loops_done = 0;
        self.finished = false;
        self.overflow = 0.0;
    }

    pub fn advance(&mut self, dt: f32) -> ClipProgress {
        if self.finished {
            return ClipProgress::Finished;
        }
        let duration = self.clip.duration_s();
        if duration <= 0.0 {
            self.finished = true;
            return ClipProgress::Finished;
        }
        self.time += dt.max(0.0);
        if self.time < duration {
            return ClipProgress::Running;
        }
        let wraps = (self.time / duration).floor() as u32;
        if let Some(n) = self.loop_count {
            let remaining = n.saturating_sub(self.loops_done);
            if wraps >= remaining {
                self.loops_done = n;
                self.overflow = (self.time - remaining as f32 * duration).max(0.0);
                self.time = duration;
                self.finished = true;
                return ClipProgress::Finished;
            }
        }
        self.loops_done = self.loops_done.saturating_add(wraps);
        self.time = self.time.rem_euclid(duration);
        ClipProgress::Looped
    }

    /// Sample every track at the current playhead.
    pub fn sample(&self, emit: &mut dyn FnMut(&str, Value)) {
        let duration = self.clip.duration_s();
        let u = if duration > 0.0 {
            (self.time / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        for track in &self.clip.tracks {
            if let Some(value) = sample_track(track, u) {
                emit(&track.target, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(duration_ms: u32) -> Arc<AnimationClip> {
        Arc::new(AnimationClip {
            name: "c".into(),
            tracks: vec![],
            duration_ms,
        })
    }

    #[test]
    fn finite_loops_finish_with_overflow() {
        let mut p = ClipPlayer::new(clip(1000), Some(2));
        assert_eq!(p.advance(0.6), ClipProgress::Running);
        assert_eq!(p.advance(0.6), ClipProgress::Looped);
        assert_eq!(p.advance(1.0), ClipProgress::Finished);
        assert!((p.overflow() - 0.2).abs() < 1e-4);
        assert_eq!(p.time(), 1.0);
        assert_eq!(p.advance(1.0), ClipProgress::Finished);
    }

    #[test]
    fn infinite_loop_wraps() {
        let mut p = ClipPlayer::new(clip(500), None);
        for _ in 0..10 {
            p.advance(0.3);
        }
        assert!(!p.is_finished());
        assert!(p.time() < 0.5);
    }

    #[test]
    fn large_steps_wrap_without_iterating() {
        let mut p = ClipPlayer::new(clip(500), None);
        assert_eq!(p.advance(1000.25), ClipProgress::Looped);
        assert!((p.time() - 0.25).abs() < 1e-2, "{}", p.time());

        let mut p = ClipPlayer::new(clip(1000), Some(3));
        assert_eq!(p.advance(10.0), ClipProgress::Finished);
        assert!((p.overflow() - 7.0).abs() < 1e-4);
        assert_eq!(p.time(), 1.0);
    }
}
