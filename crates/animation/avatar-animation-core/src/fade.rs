//! Time-based weight interpolation used by layer weights, crossfades and blend options.

use serde::{Deserialize, Serialize};

use crate::interp::functions::bezier_ease_t;

/// Easing curve applied to normalized fade progress. All curves are monotonic
/// and pinned at 0 and 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicBezier {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => t * (2.0 - t),
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicBezier { x1, y1, x2, y2 } => bezier_ease_t(t, x1, y1, x2, y2),
        }
    }
}

/// A weight in [0,1] that can move to a target over time.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightFade {
    value: f32,
    from: f32,
    target: f32,
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

impl WeightFade {
    pub fn new(value: f32) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self {
            value,
            from: value,
            target: value,
            elapsed: 0.0,
            duration: 0.0,
            easing: Easing::Linear,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_fading(&self) -> bool {
        self.duration > 0.0
    }

    /// Move toward `target`. Without a positive fade time the value is set at once;
    /// otherwise the fade restarts from the current (possibly mid-fade) value.
    pub fn set(&mut self, target: f32, fade: Option<f32>, easing: Easing) {
        let target = target.clamp(0.0, 1.0);
        self.target = target;
        self.easing = easing;
        self.elapsed = 0.0;
        match fade {
            Some(duration) if duration > 0.0 && self.value != target => {
                self.from = self.value;
                self.duration = duration;
            }
            _ => {
                self.value = target;
                self.from = target;
                self.duration = 0.0;
            }
        }
    }

    /// Advance the fade by dt seconds and return the new value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.duration > 0.0 {
            self.elapsed += dt.max(0.0);
            let t = (self.elapsed / self.duration).min(1.0);
            self.value = self.from + (self.target - self.from) * self.easing.apply(t);
            if t >= 1.0 {
                self.value = self.target;
                self.from = self.target;
                self.duration = 0.0;
            }
        }
        self.value
    }

    /// Freeze at the current value, dropping any pending fade.
    pub fn halt(&mut self) {
        self.target = self.value;
        self.from = self.value;
        self.duration = 0.0;
        self.elapsed = 0.0;
    }
}

impl Default for WeightFade {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should reach the target after the fade time and never move backwards
    #[test]
    fn fade_in_is_monotonic() {
        let mut w = WeightFade::new(0.0);
        w.set(1.0, Some(0.12), Easing::Linear);
        let mut last = 0.0;
        let mut elapsed = 0.0;
        while elapsed < 0.12 {
            let v = w.advance(0.016);
            elapsed += 0.016;
            assert!(v >= last);
            last = v;
        }
        assert_eq!(w.value(), 1.0);
        assert!(!w.is_fading());
    }

    #[test]
    fn retarget_starts_from_current_value() {
        let mut w = WeightFade::new(0.0);
        w.set(1.0, Some(1.0), Easing::Linear);
        w.advance(0.5);
        assert!((w.value() - 0.5).abs() < 1e-5);
        w.set(0.0, Some(1.0), Easing::Linear);
        w.advance(0.5);
        assert!((w.value() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn zero_fade_snaps() {
        let mut w = WeightFade::new(0.8);
        w.set(0.0, Some(0.0), Easing::QuadraticInOut);
        assert_eq!(w.value(), 0.0);
    }

    #[test]
    fn easings_are_pinned() {
        for e in [
            Easing::Linear,
            Easing::QuadraticIn,
            Easing::QuadraticOut,
            Easing::QuadraticInOut,
            Easing::CubicBezier {
                x1: 0.42,
                y1: 0.0,
                x2: 0.58,
                y2: 1.0,
            },
        ] {
            assert!(e.apply(0.0).abs() < 1e-4, "{e:?}");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-4, "{e:?}");
        }
    }
}
