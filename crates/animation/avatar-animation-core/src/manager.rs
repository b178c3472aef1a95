//! LayerManager: owns every layer, advances them each frame and composes the pose.

use std::fmt;

use avatar_api_core::{Pose, PoseSink};
use indexmap::IndexMap;
use log::warn;

use crate::accumulate::Accumulator;
use crate::config::Config;
use crate::error::AnimationError;
use crate::fade::Easing;
use crate::ids::{IdAllocator, LayerId};
use crate::layer::{AnimationLayer, LayerConfig, LayerStatus, PlayOptions};
use crate::outputs::AnimationEvent;
use crate::state::{AnimationConfig, AnimationState, StateNote};

pub struct LayerManager {
    config: Config,
    ids: IdAllocator,
    layers: IndexMap<String, AnimationLayer>,
    rest_pose: Pose,
    pose: Pose,
    scratch: Accumulator,
    notes: Vec<StateNote>,
    events: Vec<AnimationEvent>,
    sink: Option<Box<dyn PoseSink>>,
}

impl fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerManager")
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .field("pose_targets", &self.pose.len())
            .field("pending_events", &self.events.len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl LayerManager {
    pub fn new(config: Config) -> Self {
        Self {
            ids: IdAllocator::new(),
            layers: IndexMap::with_capacity(config.expected_layers),
            rest_pose: Pose::new(),
            pose: Pose::new(),
            scratch: Accumulator::with_capacity(config.expected_targets),
            notes: Vec::new(),
            events: Vec::new(),
            sink: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ----- layers -----

    pub fn add_layer(&mut self, name: &str, config: LayerConfig) -> Result<LayerId, AnimationError> {
        if self.layers.contains_key(name) {
            return Err(AnimationError::DuplicateLayer {
                layer: name.to_string(),
            });
        }
        let id = self.ids.alloc_layer();
        self.layers
            .insert(name.to_string(), AnimationLayer::new(id, name.to_string(), config));
        Ok(id)
    }

    pub fn remove_layer(&mut self, name: &str) -> Result<(), AnimationError> {
        self.layers
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| unknown_layer(name))
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Layer names in registration (composition) order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn layer(&self, name: &str) -> Option<&AnimationLayer> {
        self.layers.get(name)
    }

    fn layer_mut(&mut self, name: &str) -> Result<&mut AnimationLayer, AnimationError> {
        self.layers.get_mut(name).ok_or_else(|| unknown_layer(name))
    }

    fn layer_ref(&self, name: &str) -> Result<&AnimationLayer, AnimationError> {
        self.layers.get(name).ok_or_else(|| unknown_layer(name))
    }

    /// Set a layer's weight, optionally fading from its current value.
    pub fn set_layer_weight(
        &mut self,
        name: &str,
        weight: f32,
        fade: Option<f32>,
        easing: Easing,
    ) -> Result<(), AnimationError> {
        self.layer_mut(name)?.set_weight(weight, fade, easing);
        Ok(())
    }

    pub fn layer_weight(&self, name: &str) -> Result<f32, AnimationError> {
        Ok(self.layer_ref(name)?.weight())
    }

    pub fn layer_target_weight(&self, name: &str) -> Result<f32, AnimationError> {
        Ok(self.layer_ref(name)?.target_weight())
    }

    pub fn layer_status(&self, name: &str) -> Result<LayerStatus, AnimationError> {
        Ok(self.layer_ref(name)?.status())
    }

    // ----- animations -----

    pub fn add_animation(
        &mut self,
        layer: &str,
        animation: &str,
        config: AnimationConfig,
    ) -> Result<(), AnimationError> {
        self.layer_mut(layer)?.add_animation(animation, config)
    }

    pub fn animation(&self, layer: &str, animation: &str) -> Option<&AnimationState> {
        self.layers.get(layer)?.animation(animation)
    }

    pub fn active_animation(&self, layer: &str) -> Result<Option<&str>, AnimationError> {
        Ok(self.layer_ref(layer)?.active_animation())
    }

    /// Make `animation` the layer's active state, crossfading from the previous one.
    pub fn play_animation(
        &mut self,
        layer: &str,
        animation: &str,
        options: PlayOptions,
    ) -> Result<(), AnimationError> {
        let easing = self.config.default_easing;
        let layer = self.layers.get_mut(layer).ok_or_else(|| unknown_layer(layer))?;
        layer.play(animation, options, easing, &mut self.events)
    }

    pub fn stop_animation(&mut self, layer: &str) -> Result<(), AnimationError> {
        let layer = self.layers.get_mut(layer).ok_or_else(|| unknown_layer(layer))?;
        layer.stop(&mut self.events);
        Ok(())
    }

    pub fn pause_animation(&mut self, layer: &str) -> Result<(), AnimationError> {
        self.layer_mut(layer)?.pause();
        Ok(())
    }

    pub fn resume_animation(&mut self, layer: &str) -> Result<(), AnimationError> {
        self.layer_mut(layer)?.resume();
        Ok(())
    }

    /// Drive one FreeBlend option weight.
    pub fn set_blend_weight(
        &mut self,
        layer: &str,
        animation: &str,
        option: &str,
        weight: f32,
        fade: Option<f32>,
        easing: Easing,
    ) -> Result<(), AnimationError> {
        self.layer_mut(layer)?
            .animation_mut(animation)?
            .set_blend_weight(animation, option, weight, fade, easing)
    }

    pub fn blend_weight(&self, layer: &str, animation: &str, option: &str) -> Result<f32, AnimationError> {
        let layer_ref = self.layer_ref(layer)?;
        layer_ref
            .animation(animation)
            .ok_or_else(|| AnimationError::UnknownAnimation {
                layer: layer.to_string(),
                animation: animation.to_string(),
            })?
            .blend_weight(animation, option)
    }

    /// Move the 2D parameter of a Blend2d animation.
    pub fn set_blend_parameter(
        &mut self,
        layer: &str,
        animation: &str,
        parameter: [f32; 2],
    ) -> Result<(), AnimationError> {
        self.layer_mut(layer)?
            .animation_mut(animation)?
            .set_blend_parameter(animation, parameter)
    }

    // ----- pose -----

    /// Pose every update starts from before layers are applied.
    pub fn set_rest_pose(&mut self, pose: Pose) {
        self.rest_pose = pose;
    }

    pub fn rest_pose(&self) -> &Pose {
        &self.rest_pose
    }

    pub fn set_sink(&mut self, sink: Box<dyn PoseSink>) {
        self.sink = Some(sink);
    }

    pub fn take_sink(&mut self) -> Option<Box<dyn PoseSink>> {
        self.sink.take()
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance every layer by `dt` seconds, compose the pose in registration
    /// order and write it to the sink.
    pub fn update(&mut self, dt: f32) -> &Pose {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for layer in self.layers.values_mut() {
            layer.update(dt, &mut self.notes, &mut self.events);
        }

        let max_events = self.config.max_events_per_tick;
        if self.events.len() > max_events {
            let dropped = self.events.len() - max_events;
            warn!("dropping {dropped} undrained animation events");
            self.events.drain(..dropped);
        }

        self.pose.copy_from(&self.rest_pose);
        for layer in self.layers.values() {
            layer.compose(&mut self.pose, &mut self.scratch);
        }

        if let Some(sink) = &mut self.sink {
            sink.apply_pose(&self.pose);
        }
        &self.pose
    }
}

fn unknown_layer(name: &str) -> AnimationError {
    AnimationError::UnknownLayer {
        layer: name.to_string(),
    }
}
