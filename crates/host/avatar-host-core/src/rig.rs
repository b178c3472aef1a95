//! Standard rig: the layer stack a speaking humanoid avatar is set up with.
//!
//! Layers, in registration (and therefore composition) order:
//! Base, Face, Blink, Talk, Gesture, Emote, Viseme, one per look config, and
//! BindPoseOffset. Each section installs independently; a missing clip fails
//! only its own section.

use std::sync::Arc;

use avatar_animation_core::{
    parse_clip_json, AnimationClip, AnimationConfig, Blend2dOption, BlendMode, BlendOption,
    LayerConfig, LayerManager, PlayOptions, QueueEntry,
};
use avatar_speech_core::Viseme;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{GestureConfigs, PoiLayerConfig};
use crate::error::HostError;

/// Frame rate that gesture queue and pose-slice frame numbers refer to.
pub const SUBCLIP_FPS: f32 = 30.0;

pub mod layer_names {
    pub const BASE: &str = "Base";
    pub const FACE: &str = "Face";
    pub const BLINK: &str = "Blink";
    pub const TALK: &str = "Talk";
    pub const GESTURE: &str = "Gesture";
    pub const EMOTE: &str = "Emote";
    pub const VISEME: &str = "Viseme";
    pub const BIND_POSE_OFFSET: &str = "BindPoseOffset";
}

/// Clips available to the rig, by name.
#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: IndexMap<String, Arc<AnimationClip>>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, clip: AnimationClip) {
        self.clips.insert(clip.name.clone(), Arc::new(clip));
    }

    /// Parse and add one stored-animation JSON document.
    pub fn insert_json(&mut self, json: &str) -> Result<(), HostError> {
        self.insert(parse_clip_json(json)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.clips.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&AnimationClip, HostError> {
        self.clips
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| HostError::missing_clip(name))
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }
}

/// Which clips fill which layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardRig {
    pub idle_clip: String,
    pub face_idle_clip: Option<String>,
    pub blink_clips: Vec<String>,
    /// Seconds between blinks.
    pub blink_interval: f32,
    pub blink_seed: Option<u64>,
    pub talk_clip: String,
    pub gesture_clips: Vec<String>,
    /// Gesture clips listed here become queues of sub-ranges.
    pub gestures: GestureConfigs,
    pub emote_clips: Vec<String>,
    /// Viseme pose clips are named `{prefix}{code}`.
    pub viseme_clip_prefix: String,
    pub viseme_animation: String,
    pub talk_animation: String,
    pub poi_layers: Vec<PoiLayerConfig>,
    pub bind_pose_offset_clip: Option<String>,
}

impl Default for StandardRig {
    fn default() -> Self {
        Self {
            idle_clip: "idle".into(),
            face_idle_clip: None,
            blink_clips: vec!["blink".into()],
            blink_interval: 3.0,
            blink_seed: None,
            talk_clip: "talk".into(),
            gesture_clips: Vec::new(),
            gestures: GestureConfigs::new(),
            emote_clips: Vec::new(),
            viseme_clip_prefix: "viseme_".into(),
            viseme_animation: "visemes".into(),
            talk_animation: "talk".into(),
            poi_layers: Vec::new(),
            bind_pose_offset_clip: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RigSection {
    Base,
    Face,
    Blink,
    Talk,
    Gesture,
    Emote,
    Viseme,
    PointOfInterest,
    BindPoseOffset,
}

/// Outcome of [`StandardRig::install`].
#[derive(Debug, Default)]
pub struct RigReport {
    pub installed: Vec<RigSection>,
    pub failed: Vec<(RigSection, HostError)>,
}

impl RigReport {
    pub fn is_installed(&self, section: RigSection) -> bool {
        self.installed.contains(&section)
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, section: RigSection, result: Result<bool, HostError>) {
        match result {
            Ok(true) => self.installed.push(section),
            Ok(false) => {}
            Err(err) => {
                warn!("rig section {section:?} not installed: {err}");
                self.failed.push((section, err));
            }
        }
    }
}

/// Additive version of `clip` restricted to frames `from..to`.
fn additive_slice(
    clip: &AnimationClip,
    name: &str,
    from: f32,
    to: f32,
) -> Result<Arc<AnimationClip>, HostError> {
    let additive = clip.clone().into_additive();
    Ok(Arc::new(additive.subclip(name, from, to, SUBCLIP_FPS)?))
}

/// The single pose of a reference-framed pose clip: frames 1..2.
fn pose_slice(clip: &AnimationClip) -> Result<Arc<AnimationClip>, HostError> {
    additive_slice(clip, &clip.name, 1.0, 2.0)
}

fn additive_layer(transition_time: f32, weight: f32) -> LayerConfig {
    LayerConfig {
        blend_mode: BlendMode::Additive,
        transition_time,
        weight,
    }
}

type SectionInstaller =
    fn(&StandardRig, &mut LayerManager, &ClipLibrary) -> Result<bool, HostError>;

/// Remove the layers a failed section registered after `before` was taken.
fn roll_back(manager: &mut LayerManager, before: &[String], section: RigSection) {
    let added: Vec<String> = manager
        .layer_names()
        .filter(|name| !before.iter().any(|b| b == name))
        .map(str::to_owned)
        .collect();
    for name in added {
        debug!("rig section {section:?} failed, removing layer {name}");
        if let Err(err) = manager.remove_layer(&name) {
            warn!("rig section {section:?}: could not remove layer {name}: {err}");
        }
    }
}

impl StandardRig {
    /// Register every section on `manager`. Sections whose clips are missing
    /// are reported and skipped; the rest still install. A failed section
    /// leaves no layers behind.
    pub fn install(&self, manager: &mut LayerManager, clips: &ClipLibrary) -> RigReport {
        let sections: [(RigSection, SectionInstaller); 9] = [
            (RigSection::Base, Self::install_base),
            (RigSection::Face, Self::install_face),
            (RigSection::Blink, Self::install_blink),
            (RigSection::Talk, Self::install_talk),
            (RigSection::Gesture, Self::install_gestures),
            (RigSection::Emote, Self::install_emotes),
            (RigSection::Viseme, Self::install_visemes),
            (RigSection::PointOfInterest, Self::install_poi),
            (RigSection::BindPoseOffset, Self::install_bind_pose_offset),
        ];
        let mut report = RigReport::default();
        for (section, install) in sections {
            let before: Vec<String> = manager.layer_names().map(str::to_owned).collect();
            let result = install(self, manager, clips);
            if result.is_err() {
                roll_back(manager, &before, section);
            }
            report.record(section, result);
        }
        debug!(
            "rig installed {} sections, {} failed",
            report.installed.len(),
            report.failed.len()
        );
        report
    }

    fn install_base(&self, m: &mut LayerManager, clips: &ClipLibrary) -> Result<bool, HostError> {
        let idle = Arc::new(clips.require(&self.idle_clip)?.clone());
        m.add_layer(layer_names::BASE, LayerConfig::default())?;
        m.add_animation(layer_names::BASE, &self.idle_clip, AnimationConfig::single(idle))?;
        m.play_animation(layer_names::BASE, &self.idle_clip, PlayOptions::immediate())?;
        Ok(true)
    }

    fn install_face(&self, m: &mut LayerManager, clips: &ClipLibrary) -> Result<bool, HostError> {
        let Some(name) = &self.face_idle_clip else {
            return Ok(false);
        };
        let clip = clips.require(name)?;
        let last_frame = clip.duration_s() * SUBCLIP_FPS;
        let face = additive_slice(clip, name, 1.0, last_frame)?;
        m.add_layer(layer_names::FACE, additive_layer(0.0, 1.0))?;
        m.add_animation(layer_names::FACE, name, AnimationConfig::single(face))?;
        m.play_animation(layer_names::FACE, name, PlayOptions::immediate())?;
        Ok(true)
    }

    fn install_blink(&self, m: &mut LayerManager, clips: &ClipLibrary) -> Result<bool, HostError> {
        if self.blink_clips.is_empty() {
            return Ok(false);
        }
        let options = self
            .blink_clips
            .iter()
            .map(|name| -> Result<_, HostError> {
                Ok(Arc::new(clips.require(name)?.clone().into_additive()))
            })
            .collect::<Result<Vec<_>, HostError>>()?;
        m.add_layer(layer_names::BLINK, additive_layer(0.075, 1.0))?;
        m.add_animation(
            layer_names::BLINK,
            "blink",
            AnimationConfig::Random {
                options,
                play_interval: self.blink_interval,
                seed: self.blink_seed,
            },
        )?;
        m.play_animation(layer_names::BLINK, "blink", PlayOptions::immediate())?;
        Ok(true)
    }

    fn install_talk(&self, m: &mut LayerManager, clips: &ClipLibrary) -> Result<bool, HostError> {
        let talk = Arc::new(clips.require(&self.talk_clip)?.clone().into_additive());
        m.add_layer(layer_names::TALK, additive_layer(0.75, 0.0))?;
        m.add_animation(layer_names::TALK, &self.talk_animation, AnimationConfig::single(talk))?;
        m.play_animation(layer_names::TALK, &self.talk_animation, PlayOptions::immediate())?;
        Ok(true)
    }

    fn install_gestures(
        &self,
        m: &mut LayerManager,
        clips: &ClipLibrary,
    ) -> Result<bool, HostError> {
        let mut animations = Vec::with_capacity(self.gesture_clips.len());
        for name in &self.gesture_clips {
            let clip = clips.require(name)?.clone().into_additive();
            let config = match self.gestures.get(name) {
                Some(queue) => {
                    let subclips = queue
                        .queue_options
                        .iter()
                        .map(|opt| -> Result<QueueEntry, HostError> {
                            let sub = clip.subclip(
                                &format!("{name}_{}", opt.name),
                                opt.from,
                                opt.to,
                                SUBCLIP_FPS,
                            )?;
                            Ok(QueueEntry {
                                clip: Arc::new(sub),
                                loop_count: opt.loop_count,
                            })
                        })
                        .collect::<Result<Vec<_>, HostError>>()?;
                    AnimationConfig::Queue {
                        subclips,
                        transition_between: queue.transition_between,
                    }
                }
                None => AnimationConfig::Single {
                    clip: Arc::new(clip),
                    loop_count: Some(1),
                },
            };
            animations.push((name, config));
        }
        m.add_layer(layer_names::GESTURE, additive_layer(0.5, 1.0))?;
        for (name, config) in animations {
            m.add_animation(layer_names::GESTURE, name, config)?;
        }
        Ok(true)
    }

    fn install_emotes(&self, m: &mut LayerManager, clips: &ClipLibrary) -> Result<bool, HostError> {
        let emotes = self
            .emote_clips
            .iter()
            .map(|name| -> Result<_, HostError> { Ok((name, Arc::new(clips.require(name)?.clone()))) })
            .collect::<Result<Vec<_>, HostError>>()?;
        m.add_layer(
            layer_names::EMOTE,
            LayerConfig {
                transition_time: 0.5,
                ..LayerConfig::default()
            },
        )?;
        for (name, clip) in emotes {
            m.add_animation(
                layer_names::EMOTE,
                name,
                AnimationConfig::Single {
                    clip,
                    loop_count: Some(1),
                },
            )?;
        }
        Ok(true)
    }

    fn install_visemes(
        &self,
        m: &mut LayerManager,
        clips: &ClipLibrary,
    ) -> Result<bool, HostError> {
        let options = Viseme::ALL
            .iter()
            .map(|viseme| -> Result<BlendOption, HostError> {
                let clip_name = format!("{}{}", self.viseme_clip_prefix, viseme.code());
                let clip = clips.require(&clip_name)?;
                Ok(BlendOption::new(viseme.code(), pose_slice(clip)?, 0.0))
            })
            .collect::<Result<Vec<_>, HostError>>()?;
        m.add_layer(layer_names::VISEME, additive_layer(0.12, 0.0))?;
        m.add_animation(
            layer_names::VISEME,
            &self.viseme_animation,
            AnimationConfig::FreeBlend { options },
        )?;
        m.play_animation(layer_names::VISEME, &self.viseme_animation, PlayOptions::immediate())?;
        Ok(true)
    }

    fn install_poi(&self, m: &mut LayerManager, clips: &ClipLibrary) -> Result<bool, HostError> {
        if self.poi_layers.is_empty() {
            return Ok(false);
        }
        let mut layers = Vec::with_capacity(self.poi_layers.len());
        for layer in &self.poi_layers {
            let options = layer
                .blend_state_options
                .iter()
                .map(|opt| -> Result<Blend2dOption, HostError> {
                    let clip = clips.require(&opt.clip)?;
                    Ok(Blend2dOption::new(
                        opt.name.clone(),
                        pose_slice(clip)?,
                        [opt.blend_value_x, opt.blend_value_y],
                    ))
                })
                .collect::<Result<Vec<_>, HostError>>()?;
            layers.push((layer, options));
        }
        for (layer, options) in layers {
            m.add_layer(&layer.name, additive_layer(0.0, 1.0))?;
            m.add_animation(
                &layer.name,
                &layer.animation,
                AnimationConfig::Blend2d {
                    options,
                    parameter: [0.0, 0.0],
                },
            )?;
            m.play_animation(&layer.name, &layer.animation, PlayOptions::immediate())?;
        }
        Ok(true)
    }

    fn install_bind_pose_offset(
        &self,
        m: &mut LayerManager,
        clips: &ClipLibrary,
    ) -> Result<bool, HostError> {
        let Some(name) = &self.bind_pose_offset_clip else {
            return Ok(false);
        };
        // Already a delta clip; only the pose frame is sliced out.
        let offset = Arc::new(clips.require(name)?.subclip(name, 1.0, 2.0, SUBCLIP_FPS)?);
        m.add_layer(layer_names::BIND_POSE_OFFSET, additive_layer(0.0, 1.0))?;
        m.add_animation(layer_names::BIND_POSE_OFFSET, name, AnimationConfig::single(offset))?;
        m.play_animation(layer_names::BIND_POSE_OFFSET, name, PlayOptions::immediate())?;
        Ok(true)
    }
}
