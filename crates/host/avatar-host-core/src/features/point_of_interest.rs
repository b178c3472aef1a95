//! Look-at: turns a world-space target into yaw/pitch angles that drive the
//! Blend2d parameter of each look layer.
//!
//! Reference joints face +Z with +X to their right and +Y up. The caller
//! reports joint positions each frame; there is no scene graph here.

use hashbrown::HashMap;

use avatar_animation_core::{AnimationError, LayerManager};

use crate::config::{PoiConfig, PoiLayerConfig};
use crate::error::HostError;

#[derive(Clone, Debug)]
struct LookLayer {
    name: String,
    animation: String,
    reference: String,
    /// Current [yaw, pitch] in degrees.
    angles: [f32; 2],
}

#[derive(Debug)]
pub struct PointOfInterestFeature {
    config: PoiConfig,
    layers: Vec<LookLayer>,
    target: Option<[f32; 3]>,
    references: HashMap<String, [f32; 3]>,
}

/// Yaw and pitch in degrees from `from` to `to`, clamped to the limits.
pub fn look_angles(from: [f32; 3], to: [f32; 3], max_yaw: f32, max_pitch: f32) -> [f32; 2] {
    let d = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];
    let flat = (d[0] * d[0] + d[2] * d[2]).sqrt();
    if flat <= f32::EPSILON && d[1].abs() <= f32::EPSILON {
        return [0.0, 0.0];
    }
    let yaw = d[0].atan2(d[2]).to_degrees();
    let pitch = d[1].atan2(flat).to_degrees();
    [
        yaw.clamp(-max_yaw.abs(), max_yaw.abs()),
        pitch.clamp(-max_pitch.abs(), max_pitch.abs()),
    ]
}

impl PointOfInterestFeature {
    pub fn new(config: PoiConfig, layers: &[PoiLayerConfig]) -> Self {
        Self {
            config,
            layers: layers
                .iter()
                .map(|l| LookLayer {
                    name: l.name.clone(),
                    animation: l.animation.clone(),
                    reference: l.reference.clone(),
                    angles: [0.0, 0.0],
                })
                .collect(),
            target: None,
            references: HashMap::new(),
        }
    }

    pub fn validate(&self, manager: &LayerManager) -> Result<(), HostError> {
        for layer in &self.layers {
            if manager.animation(&layer.name, &layer.animation).is_none() {
                return Err(AnimationError::UnknownAnimation {
                    layer: layer.name.clone(),
                    animation: layer.animation.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn target(&self) -> Option<[f32; 3]> {
        self.target
    }

    /// `None` returns every look layer to center.
    pub fn set_target(&mut self, target: Option<[f32; 3]>) {
        self.target = target;
    }

    pub fn set_reference_position(&mut self, reference: &str, position: [f32; 3]) {
        self.references.insert(reference.to_string(), position);
    }

    /// Current angles of a look layer.
    pub fn angles(&self, layer: &str) -> Option<[f32; 2]> {
        self.layers.iter().find(|l| l.name == layer).map(|l| l.angles)
    }

    pub fn update(&mut self, dt: f32, manager: &mut LayerManager) -> Result<(), HostError> {
        let max_step = if self.config.turn_speed > 0.0 {
            self.config.turn_speed * dt.max(0.0)
        } else {
            f32::INFINITY
        };
        for layer in &mut self.layers {
            let goal = match (self.target, self.references.get(&layer.reference)) {
                (Some(target), Some(origin)) => {
                    look_angles(*origin, target, self.config.max_yaw, self.config.max_pitch)
                }
                // Unknown reference position: measure from the origin.
                (Some(target), None) => {
                    look_angles([0.0; 3], target, self.config.max_yaw, self.config.max_pitch)
                }
                (None, _) => [0.0, 0.0],
            };
            for (current, goal) in layer.angles.iter_mut().zip(goal) {
                *current += (goal - *current).clamp(-max_step, max_step);
            }
            manager.set_blend_parameter(&layer.name, &layer.animation, layer.angles)?;
        }
        Ok(())
    }
}
