//! One weighted, blended layer of animation states.

use avatar_api_core::blend::{apply_additive, lerp_values};
use avatar_api_core::Pose;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::accumulate::Accumulator;
use crate::error::AnimationError;
use crate::fade::{Easing, WeightFade};
use crate::ids::LayerId;
use crate::outputs::AnimationEvent;
use crate::state::{AnimationConfig, AnimationState, StateNote, StateProgress};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Replaces lower layers in proportion to the layer weight.
    #[default]
    Override,
    /// Adds deltas on top of lower layers.
    Additive,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub blend_mode: BlendMode,
    /// Default crossfade time in seconds for `play_animation`.
    pub transition_time: f32,
    pub weight: f32,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Override,
            transition_time: 0.0,
            weight: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerStatus {
    Idle,
    Playing,
    /// Active state wrapped around at least once.
    Looping,
    /// Active state finished and holds its final frame.
    Completed,
    Paused,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PlayOptions {
    /// Overrides the configured loop count of a single-clip animation.
    pub loop_count: Option<u32>,
    /// Crossfade time; falls back to the layer's transition time.
    pub transition_time: Option<f32>,
    pub easing: Option<Easing>,
}

impl PlayOptions {
    pub fn immediate() -> Self {
        Self {
            transition_time: Some(0.0),
            ..Self::default()
        }
    }

    pub fn with_transition(transition_time: f32) -> Self {
        Self {
            transition_time: Some(transition_time),
            ..Self::default()
        }
    }

    pub fn looping(mut self, loop_count: u32) -> Self {
        self.loop_count = Some(loop_count);
        self
    }
}

#[derive(Clone, Debug)]
struct Active {
    animation: String,
    fade: WeightFade,
}

/// Stopped state still contributing while it fades out.
#[derive(Clone, Debug)]
struct Crossfade {
    animation: String,
    state: AnimationState,
    fade: WeightFade,
}

#[derive(Debug)]
pub struct AnimationLayer {
    id: LayerId,
    name: String,
    blend_mode: BlendMode,
    transition_time: f32,
    weight: WeightFade,
    animations: IndexMap<String, AnimationState>,
    active: Option<Active>,
    outgoing: Vec<Crossfade>,
    status: LayerStatus,
    paused: bool,
}

impl AnimationLayer {
    pub(crate) fn new(id: LayerId, name: String, config: LayerConfig) -> Self {
        Self {
            id,
            name,
            blend_mode: config.blend_mode,
            transition_time: config.transition_time.max(0.0),
            weight: WeightFade::new(config.weight),
            animations: IndexMap::new(),
            active: None,
            outgoing: Vec::new(),
            status: LayerStatus::Idle,
            paused: false,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn transition_time(&self) -> f32 {
        self.transition_time
    }

    pub fn weight(&self) -> f32 {
        self.weight.value()
    }

    pub fn target_weight(&self) -> f32 {
        self.weight.target()
    }

    pub fn status(&self) -> LayerStatus {
        if self.paused {
            LayerStatus::Paused
        } else {
            self.status
        }
    }

    pub fn active_animation(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.animation.as_str())
    }

    /// Animations still crossfading out after being replaced or stopped.
    pub fn fading_out(&self) -> impl Iterator<Item = &str> {
        self.outgoing.iter().map(|c| c.animation.as_str())
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationState> {
        self.animations.get(name)
    }

    pub(crate) fn set_weight(&mut self, weight: f32, fade: Option<f32>, easing: Easing) {
        self.weight.set(weight, fade, easing);
    }

    pub(crate) fn add_animation(
        &mut self,
        name: &str,
        config: AnimationConfig,
    ) -> Result<(), AnimationError> {
        if self.animations.contains_key(name) {
            return Err(AnimationError::DuplicateAnimation {
                layer: self.name.clone(),
                animation: name.to_string(),
            });
        }
        let state = AnimationState::from_config(name, config)?;
        self.animations.insert(name.to_string(), state);
        Ok(())
    }

    pub(crate) fn animation_mut(&mut self, name: &str) -> Result<&mut AnimationState, AnimationError> {
        let layer = &self.name;
        self.animations
            .get_mut(name)
            .ok_or_else(|| AnimationError::UnknownAnimation {
                layer: layer.clone(),
                animation: name.to_string(),
            })
    }

    pub(crate) fn play(
        &mut self,
        name: &str,
        options: PlayOptions,
        default_easing: Easing,
        events: &mut Vec<AnimationEvent>,
    ) -> Result<(), AnimationError> {
        if !self.animations.contains_key(name) {
            return Err(AnimationError::UnknownAnimation {
                layer: self.name.clone(),
                animation: name.to_string(),
            });
        }
        let transition = options
            .transition_time
            .unwrap_or(self.transition_time)
            .max(0.0);
        let easing = options.easing.unwrap_or(default_easing);

        self.release_active(transition, easing, events);

        let state = self.animation_mut(name)?;
        state.restart(options.loop_count);
        let mut fade = WeightFade::new(0.0);
        fade.set(1.0, Some(transition), easing);
        self.active = Some(Active {
            animation: name.to_string(),
            fade,
        });
        self.status = LayerStatus::Playing;
        self.paused = false;
        debug!("layer {} playing {} (transition {transition}s)", self.name, name);
        events.push(AnimationEvent::Started {
            layer: self.name.clone(),
            animation: name.to_string(),
        });
        Ok(())
    }

    pub(crate) fn stop(&mut self, events: &mut Vec<AnimationEvent>) {
        self.release_active(self.transition_time, Easing::Linear, events);
        self.status = LayerStatus::Idle;
        self.paused = false;
    }

    pub(crate) fn pause(&mut self) {
        if self.active.is_some() {
            self.paused = true;
        }
    }

    pub(crate) fn resume(&mut self) {
        self.paused = false;
    }

    /// Move the active state (if any) to a frozen-fade snapshot that fades out
    /// over `transition`, or drop it when there is nothing to fade.
    fn release_active(&mut self, transition: f32, easing: Easing, events: &mut Vec<AnimationEvent>) {
        let Some(prev) = self.active.take() else {
            return;
        };
        if matches!(self.status, LayerStatus::Playing | LayerStatus::Looping) {
            events.push(AnimationEvent::Interrupted {
                layer: self.name.clone(),
                animation: prev.animation.clone(),
            });
        }
        let Some(state) = self.animations.get(&prev.animation) else {
            return;
        };
        if transition > 0.0 && prev.fade.value() > 0.0 {
            let mut snapshot = state.clone();
            snapshot.cancel_fades();
            let mut fade = WeightFade::new(prev.fade.value());
            fade.set(0.0, Some(transition), easing);
            self.outgoing.push(Crossfade {
                animation: prev.animation,
                state: snapshot,
                fade,
            });
        }
    }

    pub(crate) fn update(&mut self, dt: f32, notes: &mut Vec<StateNote>, events: &mut Vec<AnimationEvent>) {
        self.weight.advance(dt);
        if self.paused {
            return;
        }

        let name = &self.name;
        self.outgoing.retain_mut(|c| {
            c.state.advance(dt, &mut Vec::new());
            let alive = c.fade.advance(dt) > 0.0;
            if !alive {
                debug!("layer {name} finished fading out {}", c.animation);
            }
            alive
        });

        let Some(active) = &mut self.active else {
            return;
        };
        active.fade.advance(dt);
        let Some(state) = self.animations.get_mut(&active.animation) else {
            return;
        };
        notes.clear();
        let progress = state.advance(dt, notes);
        for note in notes.drain(..) {
            events.push(match note {
                StateNote::QueueAdvanced { index, clip } => AnimationEvent::QueueAdvanced {
                    layer: self.name.clone(),
                    animation: active.animation.clone(),
                    index,
                    clip,
                },
                StateNote::RandomPicked { clip } => AnimationEvent::RandomPicked {
                    layer: self.name.clone(),
                    animation: active.animation.clone(),
                    clip,
                },
            });
        }
        match progress {
            StateProgress::Running => {}
            StateProgress::Looped => {
                self.status = LayerStatus::Looping;
                events.push(AnimationEvent::Looped {
                    layer: self.name.clone(),
                    animation: active.animation.clone(),
                });
            }
            StateProgress::Completed => {
                if self.status != LayerStatus::Completed {
                    self.status = LayerStatus::Completed;
                    debug!("layer {} completed {}", self.name, active.animation);
                    events.push(AnimationEvent::Completed {
                        layer: self.name.clone(),
                        animation: active.animation.clone(),
                    });
                }
            }
        }
    }

    /// Blend this layer's contribution into `pose`.
    pub(crate) fn compose(&self, pose: &mut Pose, acc: &mut Accumulator) {
        let layer_weight = self.weight.value();
        if layer_weight <= 0.0 {
            return;
        }
        let sources = self
            .outgoing
            .iter()
            .map(|c| (&c.state, c.fade.value()))
            .chain(self.active.as_ref().and_then(|a| {
                self.animations
                    .get(&a.animation)
                    .map(|s| (s, a.fade.value()))
            }));

        match self.blend_mode {
            BlendMode::Override => {
                for (state, fade) in sources {
                    if fade <= 0.0 {
                        continue;
                    }
                    state.sample(&mut |target, value, w| acc.add(target, &value, w * fade));
                }
                for (target, value, total) in acc.drain() {
                    let alpha = layer_weight * total.min(1.0);
                    if alpha <= 0.0 {
                        continue;
                    }
                    let blended = match pose.get(&target) {
                        Some(base) => lerp_values(base, &value, alpha),
                        None => value,
                    };
                    pose.set(target, blended);
                }
            }
            BlendMode::Additive => {
                for (state, fade) in sources {
                    if fade <= 0.0 {
                        continue;
                    }
                    state.sample(&mut |target, delta, w| {
                        let weight = layer_weight * w * fade;
                        if weight <= 0.0 {
                            return;
                        }
                        let base = pose
                            .get(target)
                            .cloned()
                            .unwrap_or_else(|| delta.identity_like());
                        pose.set(target, apply_additive(&base, &delta, weight));
                    });
                }
            }
        }
    }
}
