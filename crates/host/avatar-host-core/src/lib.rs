//! avatar-host
//!
//! Frame driver for a speaking avatar. [`HostController`] owns the
//! [`LayerManager`] and a set of optional features (speech, lipsync,
//! gesture, point of interest); [`HostController::update`] advances them in a
//! fixed order and returns the frame's [`HostEvent`]s.

pub mod config;
pub mod error;
pub mod events;
pub mod features;
mod frame;
pub mod mark_commands;
pub mod rig;

use std::sync::Arc;

use avatar_animation_core::LayerManager;
use avatar_speech_core::{
    AudioPlayback, SpeechProvider, TimelineBuilder, VisemeCrosswalk, VoiceConfig,
};
use uuid::Uuid;

pub use crate::config::{
    GestureConfigs, GestureFeatureConfig, GestureLayerConfig, GestureQueueConfig, HostConfig,
    LipsyncConfig, PoiBlendStateOption, PoiConfig, PoiLayerConfig, QueueOptionConfig,
};
pub use crate::error::HostError;
pub use crate::events::HostEvent;
pub use crate::features::{
    GestureFeature, LipsyncFeature, PointOfInterestFeature, SpeechFeature, SpeechUpdate,
};
pub use crate::mark_commands::HostCommand;
pub use crate::rig::{layer_names, ClipLibrary, RigReport, RigSection, StandardRig};

#[derive(Debug, Clone, PartialEq)]
pub struct HostFrame {
    pub epoch: u64,
    pub dt: f32,
    /// Events in the order they happened: control calls since the last
    /// frame, speech, commands, then animation.
    pub events: Vec<HostEvent>,
}

pub struct HostController {
    pub(crate) animation: LayerManager,
    pub(crate) speech: Option<SpeechFeature>,
    pub(crate) lipsync: Option<LipsyncFeature>,
    pub(crate) gesture: Option<GestureFeature>,
    pub(crate) point_of_interest: Option<PointOfInterestFeature>,
    pub(crate) epoch: u64,
    /// Events raised by control calls, reported with the next frame.
    pub(crate) pending: Vec<HostEvent>,
}

impl std::fmt::Debug for HostController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostController")
            .field("epoch", &self.epoch)
            .field("layers", &self.animation.layer_names().collect::<Vec<_>>())
            .field("speech", &self.speech)
            .field("lipsync", &self.lipsync)
            .field("gesture", &self.gesture)
            .field("point_of_interest", &self.point_of_interest)
            .finish()
    }
}

impl HostController {
    pub fn new(animation: LayerManager) -> Self {
        Self {
            animation,
            speech: None,
            lipsync: None,
            gesture: None,
            point_of_interest: None,
            epoch: 0,
            pending: Vec::new(),
        }
    }

    /// Build the standard rig and attach every feature its sections support.
    /// Speech is attached when a provider is given. Sections that failed are
    /// listed in the report and their features left off.
    pub fn standard(
        config: &HostConfig,
        rig: &StandardRig,
        clips: &ClipLibrary,
        speech: Option<(Arc<dyn SpeechProvider>, Box<dyn AudioPlayback>)>,
    ) -> (Self, RigReport) {
        let mut manager = LayerManager::new(config.animation.clone());
        let mut report = rig.install(&mut manager, clips);
        let mut host = Self::new(manager);

        if let Some((provider, audio)) = speech {
            let builder = TimelineBuilder::new(VisemeCrosswalk::azure(), config.scheduler.clone());
            host = host.with_speech(SpeechFeature::new(
                provider,
                audio,
                builder,
                config.voice.clone(),
            ));
        }
        if report.is_installed(RigSection::Viseme) && report.is_installed(RigSection::Talk) {
            let lipsync = LipsyncFeature::new(config.lipsync.clone());
            if let Err(err) = host.attach_lipsync(lipsync) {
                report.failed.push((RigSection::Viseme, err));
            }
        }
        if report.is_installed(RigSection::Gesture) && report.is_installed(RigSection::Emote) {
            let gesture = GestureFeature::new(config.gesture.clone());
            if let Err(err) = host.attach_gesture(gesture) {
                report.failed.push((RigSection::Gesture, err));
            }
        }
        if report.is_installed(RigSection::PointOfInterest) {
            let poi = PointOfInterestFeature::new(config.point_of_interest.clone(), &rig.poi_layers);
            if let Err(err) = host.attach_point_of_interest(poi) {
                report.failed.push((RigSection::PointOfInterest, err));
            }
        }
        (host, report)
    }

    pub fn with_speech(mut self, speech: SpeechFeature) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn attach_lipsync(&mut self, lipsync: LipsyncFeature) -> Result<(), HostError> {
        lipsync.validate(&self.animation)?;
        self.lipsync = Some(lipsync);
        Ok(())
    }

    pub fn attach_gesture(&mut self, gesture: GestureFeature) -> Result<(), HostError> {
        gesture.validate(&self.animation)?;
        self.gesture = Some(gesture);
        Ok(())
    }

    pub fn attach_point_of_interest(
        &mut self,
        poi: PointOfInterestFeature,
    ) -> Result<(), HostError> {
        poi.validate(&self.animation)?;
        self.point_of_interest = Some(poi);
        Ok(())
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn animation(&self) -> &LayerManager {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut LayerManager {
        &mut self.animation
    }

    pub fn speech(&self) -> Option<&SpeechFeature> {
        self.speech.as_ref()
    }

    pub fn lipsync(&self) -> Option<&LipsyncFeature> {
        self.lipsync.as_ref()
    }

    pub fn gesture(&self) -> Option<&GestureFeature> {
        self.gesture.as_ref()
    }

    pub fn point_of_interest(&self) -> Option<&PointOfInterestFeature> {
        self.point_of_interest.as_ref()
    }

    // ----- speech controls -----

    /// Speak `text` with the configured voice, stopping any current utterance.
    pub fn speak(&mut self, text: &str) -> Result<Uuid, HostError> {
        let speech = self.speech.as_mut().ok_or(HostError::FeatureMissing { feature: "speech" })?;
        Ok(speech.speak(text, &mut self.pending))
    }

    pub fn speak_with(
        &mut self,
        text: &str,
        voice: &VoiceConfig,
        force: bool,
    ) -> Result<Uuid, HostError> {
        let speech = self.speech.as_mut().ok_or(HostError::FeatureMissing { feature: "speech" })?;
        Ok(speech.speak_with(text, voice, force, &mut self.pending))
    }

    pub fn pause(&mut self) -> Result<bool, HostError> {
        let speech = self.speech.as_mut().ok_or(HostError::FeatureMissing { feature: "speech" })?;
        let paused = speech.pause(&mut self.pending);
        if paused {
            if let Some(lipsync) = self.lipsync.as_mut() {
                lipsync.speech_paused(&mut self.animation)?;
            }
        }
        Ok(paused)
    }

    pub fn resume(&mut self) -> Result<bool, HostError> {
        let speech = self.speech.as_mut().ok_or(HostError::FeatureMissing { feature: "speech" })?;
        let resumed = speech.resume(&mut self.pending);
        if resumed {
            if let Some(lipsync) = self.lipsync.as_mut() {
                lipsync.speech_resumed(&mut self.animation)?;
            }
        }
        Ok(resumed)
    }

    /// Stop speech. Lipsync layers fade out from the next frame on.
    pub fn stop(&mut self) -> Result<bool, HostError> {
        let pending = &mut self.pending;
        let stopped = self.speech.as_mut().map(|s| s.stop(pending));
        stopped.ok_or(HostError::FeatureMissing { feature: "speech" })
    }

    // ----- gestures and look-at -----

    fn gesture_parts(&mut self) -> Result<(&mut GestureFeature, &mut LayerManager), HostError> {
        match self.gesture.as_mut() {
            Some(g) => Ok((g, &mut self.animation)),
            None => Err(HostError::FeatureMissing { feature: "gesture" }),
        }
    }

    /// Returns `Ok(false)` when the layer's minimum interval throttled it.
    pub fn play_gesture(
        &mut self,
        layer: &str,
        animation: &str,
        force: bool,
    ) -> Result<bool, HostError> {
        let (gesture, manager) = self.gesture_parts()?;
        let played = gesture.play_gesture(manager, layer, animation, force)?;
        if !played {
            self.pending.push(HostEvent::GestureThrottled {
                layer: layer.to_string(),
                animation: animation.to_string(),
            });
        }
        Ok(played)
    }

    /// Emotes are gestures on the Emote layer.
    pub fn play_emote(&mut self, animation: &str) -> Result<bool, HostError> {
        self.play_gesture(layer_names::EMOTE, animation, false)
    }

    pub fn stop_gesture(&mut self, layer: &str) -> Result<(), HostError> {
        let (gesture, manager) = self.gesture_parts()?;
        gesture.stop_gesture(manager, layer)
    }

    pub fn set_look_target(&mut self, target: Option<[f32; 3]>) -> Result<(), HostError> {
        self.point_of_interest
            .as_mut()
            .ok_or(HostError::FeatureMissing {
                feature: "point_of_interest",
            })?
            .set_target(target);
        Ok(())
    }

    pub fn set_reference_position(
        &mut self,
        reference: &str,
        position: [f32; 3],
    ) -> Result<(), HostError> {
        self.point_of_interest
            .as_mut()
            .ok_or(HostError::FeatureMissing {
                feature: "point_of_interest",
            })?
            .set_reference_position(reference, position);
        Ok(())
    }

    /// Advance everything by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Result<HostFrame, HostError> {
        self.epoch = self.epoch.wrapping_add(1);
        crate::frame::run_frame(self, dt)
    }
}
