//! Serde configuration for the host and its features.
//!
//! Every section has a `Default` matching the standard rig, so a partial JSON
//! document only needs the values it changes.

use avatar_animation_core::{Config as AnimationConfig, Easing};
use avatar_speech_core::{SchedulerConfig, VoiceConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::rig::layer_names;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub animation: AnimationConfig,
    pub voice: VoiceConfig,
    pub scheduler: SchedulerConfig,
    pub lipsync: LipsyncConfig,
    pub gesture: GestureFeatureConfig,
    pub point_of_interest: PoiConfig,
}

impl HostConfig {
    pub fn from_json(json: &str) -> Result<Self, HostError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Which layers lipsync drives and how fast they react.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipsyncConfig {
    pub viseme_layer: String,
    /// FreeBlend animation holding one option per viseme code.
    pub viseme_animation: String,
    /// Crossfade window between consecutive visemes, seconds.
    pub viseme_blend_time: f32,
    pub viseme_easing: Easing,
    pub talk_layer: String,
    pub talk_animation: String,
    pub talk_blend_time: f32,
    pub talk_easing: Easing,
}

impl Default for LipsyncConfig {
    fn default() -> Self {
        Self {
            viseme_layer: layer_names::VISEME.into(),
            viseme_animation: "visemes".into(),
            viseme_blend_time: 0.12,
            viseme_easing: Easing::Linear,
            talk_layer: layer_names::TALK.into(),
            talk_animation: "talk".into(),
            talk_blend_time: 0.75,
            talk_easing: Easing::QuadraticInOut,
        }
    }
}

/// Per-layer gesture playback settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureLayerConfig {
    /// Seconds that must pass between non-forced gestures on this layer.
    pub minimum_interval: f32,
    /// Fade time for the layer weight and the animation crossfade.
    pub blend_time: f32,
    pub easing: Easing,
}

impl Default for GestureLayerConfig {
    fn default() -> Self {
        Self {
            minimum_interval: 0.0,
            blend_time: 0.5,
            easing: Easing::Linear,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureFeatureConfig {
    pub layers: IndexMap<String, GestureLayerConfig>,
}

impl Default for GestureFeatureConfig {
    fn default() -> Self {
        let mut layers = IndexMap::new();
        layers.insert(
            layer_names::GESTURE.to_string(),
            GestureLayerConfig {
                minimum_interval: 3.0,
                ..GestureLayerConfig::default()
            },
        );
        layers.insert(
            layer_names::EMOTE.to_string(),
            GestureLayerConfig {
                easing: Easing::QuadraticInOut,
                ..GestureLayerConfig::default()
            },
        );
        Self { layers }
    }
}

/// Look-at limits, in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiConfig {
    pub max_yaw: f32,
    pub max_pitch: f32,
    /// Angular speed toward a new target; `0` snaps.
    pub turn_speed: f32,
}

impl Default for PoiConfig {
    fn default() -> Self {
        Self {
            max_yaw: 60.0,
            max_pitch: 30.0,
            turn_speed: 240.0,
        }
    }
}

/// Frame range of one gesture segment. Frames are at 30 fps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueOptionConfig {
    pub name: String,
    #[serde(alias = "startOffset")]
    pub from: f32,
    #[serde(alias = "endOffset")]
    pub to: f32,
    #[serde(default = "default_queue_loops")]
    pub loop_count: Option<u32>,
}

fn default_queue_loops() -> Option<u32> {
    Some(1)
}

/// Splits a gesture clip into a queue of segments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureQueueConfig {
    pub queue_options: Vec<QueueOptionConfig>,
    #[serde(default)]
    pub transition_between: f32,
}

/// Gesture clip name to queue layout.
pub type GestureConfigs = IndexMap<String, GestureQueueConfig>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiBlendStateOption {
    pub name: String,
    pub clip: String,
    pub blend_value_x: f32,
    pub blend_value_y: f32,
}

/// One look-at layer: a Blend2d animation over yaw/pitch poses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiLayerConfig {
    pub name: String,
    pub animation: String,
    /// Joint the look angles are measured from.
    pub reference: String,
    pub blend_state_options: Vec<PoiBlendStateOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = HostConfig::from_json(r#"{"lipsync":{"viseme_blend_time":0.2}}"#).unwrap();
        assert_eq!(cfg.lipsync.viseme_blend_time, 0.2);
        assert_eq!(cfg.lipsync.talk_layer, "Talk");
        assert_eq!(cfg.gesture.layers["Gesture"].minimum_interval, 3.0);
        assert_eq!(cfg.scheduler.min_end_mark_duration_ms, 50.0);
    }

    #[test]
    fn queue_option_accepts_offsets() {
        let opt: QueueOptionConfig =
            serde_json::from_str(r#"{"name":"b","startOffset":30,"endOffset":60}"#).unwrap();
        assert_eq!((opt.from, opt.to), (30.0, 60.0));
        assert_eq!(opt.loop_count, Some(1));
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            HostConfig::from_json("{"),
            Err(HostError::Config(_))
        ));
    }
}
