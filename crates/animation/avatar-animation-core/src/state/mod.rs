//! Animation states: the closed set of playback behaviors a layer can hold.
//!
//! Every state is built from an [`AnimationConfig`], validated once in
//! [`AnimationState::from_config`], then advanced and sampled by its layer.
//! Sampling emits `(target, value, weight)` triples; the layer decides how
//! those weights combine (override vs additive).

mod blend2d;
mod free_blend;
mod queue;
mod random;
mod single;

use std::sync::Arc;

use avatar_api_core::Value;

use crate::data::AnimationClip;
use crate::error::{AnimationError, AnimationKind};
use crate::fade::Easing;

pub use blend2d::{Blend2dOption, Blend2dState};
pub use free_blend::{BlendOption, FreeBlendState};
pub use queue::{QueueEntry, QueueState};
pub use random::RandomState;
pub use single::SingleState;

/// Declarative description of an animation registered on a layer.
#[derive(Clone, Debug)]
pub enum AnimationConfig {
    /// One clip; `loop_count: None` loops forever.
    Single {
        clip: Arc<AnimationClip>,
        loop_count: Option<u32>,
    },
    /// Clips played in order, crossfading over `transition_between` seconds.
    Queue {
        subclips: Vec<QueueEntry>,
        transition_between: f32,
    },
    /// Waits `play_interval` seconds, plays one option once, repeats.
    Random {
        options: Vec<Arc<AnimationClip>>,
        play_interval: f32,
        /// Fixed seed for reproducible picks; `None` seeds from entropy.
        seed: Option<u64>,
    },
    /// All options loop at once with independently driven weights.
    FreeBlend { options: Vec<BlendOption> },
    /// Options placed on a plane, weighted by a live 2D parameter.
    Blend2d {
        options: Vec<Blend2dOption>,
        parameter: [f32; 2],
    },
}

impl AnimationConfig {
    pub fn single(clip: Arc<AnimationClip>) -> Self {
        AnimationConfig::Single {
            clip,
            loop_count: None,
        }
    }

    pub fn kind(&self) -> AnimationKind {
        match self {
            AnimationConfig::Single { .. } => AnimationKind::Single,
            AnimationConfig::Queue { .. } => AnimationKind::Queue,
            AnimationConfig::Random { .. } => AnimationKind::Random,
            AnimationConfig::FreeBlend { .. } => AnimationKind::FreeBlend,
            AnimationConfig::Blend2d { .. } => AnimationKind::Blend2d,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StateProgress {
    Running,
    Looped,
    /// Finished its last loop and holds the final frame.
    Completed,
}

/// Kind-specific notes produced while advancing, turned into events by the layer.
#[derive(Clone, Debug, PartialEq)]
pub enum StateNote {
    QueueAdvanced { index: usize, clip: String },
    RandomPicked { clip: String },
}

#[derive(Clone, Debug)]
pub enum AnimationState {
    Single(SingleState),
    Queue(QueueState),
    Random(RandomState),
    FreeBlend(FreeBlendState),
    Blend2d(Blend2dState),
}

impl AnimationState {
    /// Validate `config` and build the matching state.
    pub fn from_config(name: &str, config: AnimationConfig) -> Result<Self, AnimationError> {
        let kind = config.kind();
        let invalid = |reason: String| AnimationError::InvalidAnimationConfig {
            animation: name.to_string(),
            kind,
            reason,
        };
        let check_clip = |clip: &AnimationClip| {
            clip.validate()
                .map_err(|e| invalid(format!("clip '{}': {e}", clip.name)))
        };
        let check_loops = |loop_count: Option<u32>| match loop_count {
            Some(0) => Err(invalid("loop_count must be at least 1".into())),
            _ => Ok(()),
        };

        match config {
            AnimationConfig::Single { clip, loop_count } => {
                check_clip(&clip)?;
                check_loops(loop_count)?;
                Ok(AnimationState::Single(SingleState::new(clip, loop_count)))
            }
            AnimationConfig::Queue {
                subclips,
                transition_between,
            } => {
                if subclips.is_empty() {
                    return Err(invalid("queue needs at least one subclip".into()));
                }
                if !(transition_between >= 0.0) || !transition_between.is_finite() {
                    return Err(invalid(format!(
                        "transition_between must be >= 0, got {transition_between}"
                    )));
                }
                for entry in &subclips {
                    check_clip(&entry.clip)?;
                    check_loops(entry.loop_count)?;
                }
                Ok(AnimationState::Queue(QueueState::new(
                    subclips,
                    transition_between,
                )))
            }
            AnimationConfig::Random {
                options,
                play_interval,
                seed,
            } => {
                if options.is_empty() {
                    return Err(invalid("random animation needs at least one option".into()));
                }
                if !(play_interval >= 0.0) || !play_interval.is_finite() {
                    return Err(invalid(format!(
                        "play_interval must be >= 0, got {play_interval}"
                    )));
                }
                for clip in &options {
                    check_clip(clip)?;
                }
                Ok(AnimationState::Random(RandomState::new(
                    options,
                    play_interval,
                    seed,
                )))
            }
            AnimationConfig::FreeBlend { options } => {
                if options.is_empty() {
                    return Err(invalid("free blend needs at least one option".into()));
                }
                for (i, opt) in options.iter().enumerate() {
                    check_clip(&opt.clip)?;
                    if !(0.0..=1.0).contains(&opt.weight) {
                        return Err(invalid(format!(
                            "weight of '{}' must be in [0,1], got {}",
                            opt.name, opt.weight
                        )));
                    }
                    if options[..i].iter().any(|o| o.name == opt.name) {
                        return Err(invalid(format!("duplicate option name '{}'", opt.name)));
                    }
                }
                Ok(AnimationState::FreeBlend(FreeBlendState::new(options)))
            }
            AnimationConfig::Blend2d { options, parameter } => {
                if options.len() < 3 {
                    return Err(invalid(format!(
                        "blend 2d needs at least 3 options, got {}",
                        options.len()
                    )));
                }
                for (i, opt) in options.iter().enumerate() {
                    check_clip(&opt.clip)?;
                    if !opt.point.iter().all(|c| c.is_finite()) {
                        return Err(invalid(format!("point of '{}' is not finite", opt.name)));
                    }
                    if options[..i].iter().any(|o| o.name == opt.name) {
                        return Err(invalid(format!("duplicate option name '{}'", opt.name)));
                    }
                }
                let state = Blend2dState::new(options, parameter);
                if state.triangle_count() == 0 {
                    return Err(invalid("option points are all collinear".into()));
                }
                Ok(AnimationState::Blend2d(state))
            }
        }
    }

    pub fn kind(&self) -> AnimationKind {
        match self {
            AnimationState::Single(_) => AnimationKind::Single,
            AnimationState::Queue(_) => AnimationKind::Queue,
            AnimationState::Random(_) => AnimationKind::Random,
            AnimationState::FreeBlend(_) => AnimationKind::FreeBlend,
            AnimationState::Blend2d(_) => AnimationKind::Blend2d,
        }
    }

    /// Rewind to the beginning. `loop_count` overrides the configured count
    /// where the kind has one.
    pub fn restart(&mut self, loop_count: Option<u32>) {
        match self {
            AnimationState::Single(s) => s.restart(loop_count),
            AnimationState::Queue(s) => s.restart(),
            AnimationState::Random(s) => s.restart(),
            AnimationState::FreeBlend(s) => s.restart(),
            AnimationState::Blend2d(s) => s.restart(),
        }
    }

    pub fn advance(&mut self, dt: f32, notes: &mut Vec<StateNote>) -> StateProgress {
        match self {
            AnimationState::Single(s) => s.advance(dt),
            AnimationState::Queue(s) => s.advance(dt, notes),
            AnimationState::Random(s) => s.advance(dt, notes),
            AnimationState::FreeBlend(s) => s.advance(dt),
            AnimationState::Blend2d(s) => s.advance(dt),
        }
    }

    /// Emit every weighted sub-clip sample.
    pub fn sample(&self, emit: &mut dyn FnMut(&str, Value, f32)) {
        match self {
            AnimationState::Single(s) => s.sample(emit),
            AnimationState::Queue(s) => s.sample(emit),
            AnimationState::Random(s) => s.sample(emit),
            AnimationState::FreeBlend(s) => s.sample(emit),
            AnimationState::Blend2d(s) => s.sample(emit),
        }
    }

    /// Freeze pending internal fades at their current values.
    pub fn cancel_fades(&mut self) {
        match self {
            AnimationState::Queue(s) => s.cancel_fades(),
            AnimationState::FreeBlend(s) => s.cancel_fades(),
            AnimationState::Single(_) | AnimationState::Random(_) | AnimationState::Blend2d(_) => {}
        }
    }

    pub fn set_blend_weight(
        &mut self,
        animation: &str,
        option: &str,
        weight: f32,
        fade: Option<f32>,
        easing: Easing,
    ) -> Result<(), AnimationError> {
        match self {
            AnimationState::FreeBlend(s) => {
                if s.set_weight(option, weight, fade, easing) {
                    Ok(())
                } else {
                    Err(AnimationError::UnknownBlendOption {
                        animation: animation.to_string(),
                        option: option.to_string(),
                    })
                }
            }
            other => Err(AnimationError::UnsupportedOperation {
                animation: animation.to_string(),
                kind: other.kind(),
                operation: "set_blend_weight",
            }),
        }
    }

    pub fn blend_weight(&self, animation: &str, option: &str) -> Result<f32, AnimationError> {
        let weight = match self {
            AnimationState::FreeBlend(s) => s.weight(option),
            AnimationState::Blend2d(s) => s.weight(option),
            other => {
                return Err(AnimationError::UnsupportedOperation {
                    animation: animation.to_string(),
                    kind: other.kind(),
                    operation: "blend_weight",
                })
            }
        };
        weight.ok_or_else(|| AnimationError::UnknownBlendOption {
            animation: animation.to_string(),
            option: option.to_string(),
        })
    }

    pub fn set_blend_parameter(
        &mut self,
        animation: &str,
        parameter: [f32; 2],
    ) -> Result<(), AnimationError> {
        match self {
            AnimationState::Blend2d(s) => {
                s.set_parameter(parameter);
                Ok(())
            }
            other => Err(AnimationError::UnsupportedOperation {
                animation: animation.to_string(),
                kind: other.kind(),
                operation: "set_blend_parameter",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Keypoint, Track, Transitions};

    fn clip(name: &str, duration_ms: u32) -> Arc<AnimationClip> {
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
                    value: Value::Float(1.0),
                    transitions: Some(Transitions::linear()),
                }],
            }],
        })
    }

    fn rejects(config: AnimationConfig) -> bool {
        matches!(
            AnimationState::from_config("a", config),
            Err(AnimationError::InvalidAnimationConfig { .. })
        )
    }

    #[test]
    fn validation_per_kind() {
        assert!(rejects(AnimationConfig::Single {
            clip: clip("c", 0),
            loop_count: None
        }));
        assert!(rejects(AnimationConfig::Single {
            clip: clip("c", 100),
            loop_count: Some(0)
        }));
        assert!(rejects(AnimationConfig::Queue {
            subclips: vec![],
            transition_between: 0.1
        }));
        assert!(rejects(AnimationConfig::Queue {
            subclips: vec![QueueEntry::new(clip("c", 100))],
            transition_between: -1.0
        }));
        assert!(rejects(AnimationConfig::Random {
            options: vec![],
            play_interval: 1.0,
            seed: None
        }));
        assert!(rejects(AnimationConfig::FreeBlend {
            options: vec![
                BlendOption::new("a", clip("c", 100), 0.0),
                BlendOption::new("a", clip("d", 100), 0.0),
            ]
        }));
        assert!(rejects(AnimationConfig::FreeBlend {
            options: vec![BlendOption::new("a", clip("c", 100), 1.5)]
        }));
        assert!(rejects(AnimationConfig::Blend2d {
            options: vec![
                Blend2dOption::new("a", clip("c", 100), [0.0, 0.0]),
                Blend2dOption::new("b", clip("c", 100), [1.0, 1.0]),
                Blend2dOption::new("c", clip("c", 100), [2.0, 2.0]),
            ],
            parameter: [0.0, 0.0]
        }));
    }

    #[test]
    fn blend_operations_check_kind() {
        let mut s = AnimationState::from_config("idle", AnimationConfig::single(clip("c", 100)))
            .unwrap();
        assert!(matches!(
            s.set_blend_parameter("idle", [0.0, 0.0]),
            Err(AnimationError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            s.set_blend_weight("idle", "x", 1.0, None, Easing::Linear),
            Err(AnimationError::UnsupportedOperation { .. })
        ));
    }
}
