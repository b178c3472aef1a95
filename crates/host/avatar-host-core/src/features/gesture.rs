//! Gestures and emotes: one-shot animations on dedicated layers, throttled
//! per layer and faded back out when they complete.

use avatar_animation_core::{AnimationError, AnimationEvent, LayerManager, PlayOptions};
use indexmap::IndexMap;
use log::debug;

use crate::config::{GestureFeatureConfig, GestureLayerConfig};
use crate::error::HostError;

#[derive(Debug)]
struct GestureLayer {
    config: GestureLayerConfig,
    /// Seconds since the last gesture started on this layer.
    since_last: f32,
    playing: Option<String>,
}

#[derive(Debug)]
pub struct GestureFeature {
    layers: IndexMap<String, GestureLayer>,
}

impl GestureFeature {
    pub fn new(config: GestureFeatureConfig) -> Self {
        let layers = config
            .layers
            .into_iter()
            .map(|(name, config)| {
                (
                    name,
                    GestureLayer {
                        config,
                        since_last: f32::INFINITY,
                        playing: None,
                    },
                )
            })
            .collect();
        Self { layers }
    }

    pub fn validate(&self, manager: &LayerManager) -> Result<(), HostError> {
        for name in self.layers.keys() {
            if !manager.has_layer(name) {
                return Err(AnimationError::UnknownLayer {
                    layer: name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn playing(&self, layer: &str) -> Option<&str> {
        self.layers.get(layer)?.playing.as_deref()
    }

    /// Start `animation` on `layer`. Returns `Ok(false)` when the layer's
    /// minimum interval has not passed and `force` is unset.
    pub fn play_gesture(
        &mut self,
        manager: &mut LayerManager,
        layer: &str,
        animation: &str,
        force: bool,
    ) -> Result<bool, HostError> {
        let entry = self
            .layers
            .get_mut(layer)
            .ok_or_else(|| AnimationError::UnknownLayer {
                layer: layer.to_string(),
            })?;
        if !force && entry.since_last < entry.config.minimum_interval {
            debug!(
                "gesture {layer}/{animation} throttled ({:.2}s < {:.2}s)",
                entry.since_last, entry.config.minimum_interval
            );
            return Ok(false);
        }
        let cfg = &entry.config;
        manager.play_animation(
            layer,
            animation,
            PlayOptions {
                transition_time: Some(cfg.blend_time),
                easing: Some(cfg.easing),
                ..PlayOptions::default()
            },
        )?;
        manager.set_layer_weight(layer, 1.0, Some(cfg.blend_time), cfg.easing)?;
        entry.since_last = 0.0;
        entry.playing = Some(animation.to_string());
        Ok(true)
    }

    /// Fade the layer out over its blend time.
    pub fn stop_gesture(&mut self, manager: &mut LayerManager, layer: &str) -> Result<(), HostError> {
        let entry = self
            .layers
            .get_mut(layer)
            .ok_or_else(|| AnimationError::UnknownLayer {
                layer: layer.to_string(),
            })?;
        manager.set_layer_weight(layer, 0.0, Some(entry.config.blend_time), entry.config.easing)?;
        entry.playing = None;
        Ok(())
    }

    pub fn update(&mut self, dt: f32) {
        for entry in self.layers.values_mut() {
            entry.since_last += dt;
        }
    }

    /// Fade a layer back out when its gesture completes.
    pub fn on_animation_events(
        &mut self,
        manager: &mut LayerManager,
        events: &[AnimationEvent],
    ) -> Result<(), HostError> {
        for event in events {
            let AnimationEvent::Completed { layer, animation } = event else {
                continue;
            };
            let Some(entry) = self.layers.get_mut(layer) else {
                continue;
            };
            if entry.playing.as_deref() == Some(animation.as_str()) {
                debug!("gesture {layer}/{animation} completed, fading out");
                manager.set_layer_weight(
                    layer,
                    0.0,
                    Some(entry.config.blend_time),
                    entry.config.easing,
                )?;
                entry.playing = None;
            }
        }
        Ok(())
    }
}
