//! Canonical clip data model.
//!
//! A clip is a set of tracks, each targeting one pose channel (joint channel or
//! morph weight) with keypoints at normalized stamps in [0,1] over `duration_ms`.

use serde::{Deserialize, Serialize};

use avatar_api_core::blend::additive_delta;
use avatar_api_core::Value;

use crate::error::AnimationError;
use crate::sampling::sample_track;

/// 2D vector used for transition control points (normalized 0..1 domain).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Per-keypoint transitions: control points for cubic-bezier timing.
/// Use `in` (arrival to this point) and `out` (departure from this point).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Transitions {
    #[serde(default)]
    #[serde(rename = "in")]
    pub r#in: Option<Vec2>,
    #[serde(default)]
    #[serde(rename = "out")]
    pub r#out: Option<Vec2>,
}

impl Transitions {
    /// Linear timing on both sides of a key.
    pub fn linear() -> Self {
        Self {
            r#in: Some(Vec2 { x: 1.0, y: 1.0 }),
            r#out: Some(Vec2 { x: 0.0, y: 0.0 }),
        }
    }
}

/// A single keypoint in normalized time [0..1].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    pub id: String,
    /// Normalized time in [0,1] within the clip duration.
    pub stamp: f32,
    pub value: Value,
    #[serde(default)]
    pub transitions: Option<Transitions>,
}

/// A track targeting one pose channel with a series of keypoints.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Pose target path (e.g. "chest.rotation").
    #[serde(alias = "animatableId")]
    pub target: String,
    pub points: Vec<Keypoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<Track>,
    /// Duration in milliseconds (authoritative for mapping normalized stamps to seconds).
    #[serde(rename = "duration")]
    pub duration_ms: u32,
}

impl AnimationClip {
    #[inline]
    pub fn duration_s(&self) -> f32 {
        self.duration_ms as f32 / 1000.0
    }

    /// Validate basic invariants (monotonic stamps in [0,1], non-zero duration).
    pub fn validate(&self) -> Result<(), AnimationError> {
        if self.duration_ms == 0 {
            return Err(AnimationError::InvalidClip {
                clip: self.name.clone(),
                reason: "duration must be > 0 ms".into(),
            });
        }
        for track in &self.tracks {
            let mut last = -f32::INFINITY;
            for p in &track.points {
                if !p.stamp.is_finite() || p.stamp < 0.0 || p.stamp > 1.0 {
                    return Err(AnimationError::InvalidClip {
                        clip: self.name.clone(),
                        reason: format!("stamp must be finite and in [0,1] for '{}'", track.target),
                    });
                }
                if p.stamp < last {
                    return Err(AnimationError::InvalidClip {
                        clip: self.name.clone(),
                        reason: format!("stamps must be non-decreasing for '{}'", track.target),
                    });
                }
                last = p.stamp;
            }
        }
        Ok(())
    }

    /// Extract the frame range [from_frame, to_frame] (at `fps`) as a new clip.
    /// Boundary keys are resampled; interior keys keep their transitions.
    pub fn subclip(
        &self,
        name: &str,
        from_frame: f32,
        to_frame: f32,
        fps: f32,
    ) -> Result<AnimationClip, AnimationError> {
        let invalid = |reason: String| AnimationError::InvalidClip {
            clip: name.to_string(),
            reason,
        };
        if !(fps > 0.0) {
            return Err(invalid(format!("fps must be > 0, got {fps}")));
        }
        let duration = self.duration_s();
        let start = (from_frame / fps).clamp(0.0, duration);
        let end = (to_frame / fps).clamp(0.0, duration);
        if !(end > start) {
            return Err(invalid(format!(
                "empty frame range {from_frame}..{to_frame} in '{}'",
                self.name
            )));
        }
        let u0 = start / duration;
        let u1 = end / duration;
        let span = u1 - u0;

        let mut tracks = Vec::with_capacity(self.tracks.len());
        for track in &self.tracks {
            let (Some(first), Some(last)) = (sample_track(track, u0), sample_track(track, u1))
            else {
                continue;
            };
            let mut points = Vec::with_capacity(track.points.len() + 2);
            points.push(Keypoint {
                id: format!("{}-start", track.id),
                stamp: 0.0,
                value: first,
                transitions: Some(Transitions::linear()),
            });
            for p in track.points.iter().filter(|p| p.stamp > u0 && p.stamp < u1) {
                points.push(Keypoint {
                    stamp: (p.stamp - u0) / span,
                    ..p.clone()
                });
            }
            points.push(Keypoint {
                id: format!("{}-end", track.id),
                stamp: 1.0,
                value: last,
                transitions: Some(Transitions::linear()),
            });
            tracks.push(Track {
                points,
                ..track.clone()
            });
        }

        Ok(AnimationClip {
            name: name.to_string(),
            tracks,
            duration_ms: (((end - start) * 1000.0).round() as u32).max(1),
        })
    }

    /// Convert every key into a delta against its track's first key, so the
    /// clip can play on an additive layer.
    pub fn make_additive(&mut self) {
        for track in &mut self.tracks {
            let Some(reference) = track.points.first().map(|p| p.value.clone()) else {
                continue;
            };
            for p in &mut track.points {
                p.value = additive_delta(&p.value, &reference);
            }
        }
    }

    /// Builder-style variant of [`AnimationClip::make_additive`].
    pub fn into_additive(mut self) -> Self {
        self.make_additive();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(name: &str, duration_ms: u32) -> AnimationClip {
        AnimationClip {
            name: name.into(),
            duration_ms,
            tracks: vec![Track {
                id: "t0".into(),
                name: "jaw".into(),
                target: "jaw.open".into(),
                points: vec![
                    Keypoint {
                        id: "k0".into(),
                        stamp: 0.0,
                        value: Value::Float(2.0),
                        transitions: Some(Transitions::linear()),
                    },
                    Keypoint {
                        id: "k1".into(),
                        stamp: 1.0,
                        value: Value::Float(4.0),
                        transitions: Some(Transitions::linear()),
                    },
                ],
            }],
        }
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(ramp("a", 0).validate().is_err());
        assert!(ramp("a", 10).validate().is_ok());
    }

    #[test]
    fn subclip_resamples_boundaries() {
        // 2s clip at 30 fps = 60 frames, frames 15..45 cover 0.5s..1.5s
        let sub = ramp("a", 2000).subclip("a_mid", 15.0, 45.0, 30.0).unwrap();
        assert_eq!(sub.duration_ms, 1000);
        let pts = &sub.tracks[0].points;
        assert_eq!(pts.len(), 2);
        assert!((pts[0].value.as_float().unwrap() - 2.5).abs() < 1e-3);
        assert!((pts[1].value.as_float().unwrap() - 3.5).abs() < 1e-3);
    }

    #[test]
    fn subclip_rejects_empty_range() {
        assert!(ramp("a", 1000).subclip("x", 10.0, 10.0, 30.0).is_err());
    }

    #[test]
    fn make_additive_zeroes_first_key() {
        let clip = ramp("a", 1000).into_additive();
        assert_eq!(clip.tracks[0].points[0].value, Value::Float(0.0));
        assert_eq!(clip.tracks[0].points[1].value, Value::Float(2.0));
    }
}
