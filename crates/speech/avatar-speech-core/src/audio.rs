//! Audio playback seam. Elapsed time for speech sync always comes from here.

use crate::error::AudioError;
use crate::provider::AudioHandle;

/// A player for one utterance at a time, polled once per frame.
pub trait AudioPlayback {
    /// Start loading `audio`, replacing anything loaded before.
    fn load(&mut self, audio: &AudioHandle) -> Result<(), AudioError>;

    /// Whether the last loaded audio can start playing.
    fn is_ready(&self) -> bool;

    fn play(&mut self) -> Result<(), AudioError>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    /// Playback position of the current audio in milliseconds.
    fn current_time_ms(&self) -> f64;

    fn has_ended(&self) -> bool;

    /// Called once per frame with the frame time before the position is read.
    /// Device-backed players keep their own clock and ignore it.
    fn tick(&mut self, _dt_ms: f64) {}
}

/// Playback driven by the frame clock instead of a device. Useful headless
/// and in tests.
#[derive(Debug, Default)]
pub struct ManualPlayback {
    loaded: Option<AudioHandle>,
    duration_ms: Option<f64>,
    position_ms: f64,
    playing: bool,
    ended: bool,
}

impl ManualPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audio reports ended once the position passes `duration_ms`.
    pub fn with_duration(duration_ms: f64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            ..Self::default()
        }
    }

    pub fn set_duration_ms(&mut self, duration_ms: Option<f64>) {
        self.duration_ms = duration_ms;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn loaded(&self) -> Option<&AudioHandle> {
        self.loaded.as_ref()
    }
}

impl AudioPlayback for ManualPlayback {
    fn load(&mut self, audio: &AudioHandle) -> Result<(), AudioError> {
        if audio.is_empty() {
            return Err(AudioError::Load {
                reason: format!("audio {} is empty", audio.id),
            });
        }
        self.loaded = Some(audio.clone());
        self.position_ms = 0.0;
        self.playing = false;
        self.ended = false;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.loaded.is_none() {
            return Err(AudioError::NotLoaded);
        }
        self.position_ms = 0.0;
        self.playing = true;
        self.ended = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn resume(&mut self) {
        if self.loaded.is_some() && !self.ended {
            self.playing = true;
        }
    }

    fn stop(&mut self) {
        self.playing = false;
        self.position_ms = 0.0;
    }

    fn current_time_ms(&self) -> f64 {
        self.position_ms
    }

    fn has_ended(&self) -> bool {
        self.ended
    }

    /// Moves the playhead forward while playing.
    fn tick(&mut self, dt_ms: f64) {
        if !self.playing {
            return;
        }
        self.position_ms += dt_ms.max(0.0);
        if let Some(d) = self.duration_ms {
            if self.position_ms >= d {
                self.position_ms = d;
                self.playing = false;
                self.ended = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_playback_lifecycle() {
        let mut p = ManualPlayback::with_duration(100.0);
        assert!(matches!(p.play(), Err(AudioError::NotLoaded)));
        p.load(&AudioHandle::new("audio/mpeg", vec![1u8, 2, 3]))
            .unwrap();
        assert!(p.is_ready());
        p.play().unwrap();
        p.tick(40.0);
        p.pause();
        p.tick(40.0);
        assert_eq!(p.current_time_ms(), 40.0);
        p.resume();
        p.tick(80.0);
        assert!(p.has_ended());
        assert_eq!(p.current_time_ms(), 100.0);
    }
}
