//! Lipsync: viseme FreeBlend weights and the talking-idle layer.

use avatar_animation_core::{AnimationKind, AnimationError, LayerManager};
use avatar_speech_core::Viseme;
use log::debug;

use crate::config::LipsyncConfig;
use crate::error::HostError;

#[derive(Debug)]
pub struct LipsyncFeature {
    config: LipsyncConfig,
    current: Option<Viseme>,
    /// Option still fading out from the last change.
    previous: Option<Viseme>,
}

impl LipsyncFeature {
    pub fn new(config: LipsyncConfig) -> Self {
        Self {
            config,
            current: None,
            previous: None,
        }
    }

    pub fn config(&self) -> &LipsyncConfig {
        &self.config
    }

    /// Viseme whose option is currently rising or held at 1.
    pub fn current(&self) -> Option<Viseme> {
        self.current
    }

    /// Viseme whose option is fading out.
    pub fn previous(&self) -> Option<Viseme> {
        self.previous
    }

    /// FreeBlend option name for a viseme.
    pub fn option_name(viseme: Viseme) -> &'static str {
        viseme.code()
    }

    /// Check the layers and every viseme option exist before attaching.
    pub fn validate(&self, manager: &LayerManager) -> Result<(), HostError> {
        let cfg = &self.config;
        let state = manager
            .animation(&cfg.viseme_layer, &cfg.viseme_animation)
            .ok_or_else(|| AnimationError::UnknownAnimation {
                layer: cfg.viseme_layer.clone(),
                animation: cfg.viseme_animation.clone(),
            })?;
        if state.kind() != AnimationKind::FreeBlend {
            return Err(AnimationError::UnsupportedOperation {
                animation: cfg.viseme_animation.clone(),
                kind: state.kind(),
                operation: "lipsync",
            }
            .into());
        }
        for viseme in Viseme::ALL {
            state.blend_weight(&cfg.viseme_animation, Self::option_name(viseme))?;
        }
        if !manager.has_layer(&cfg.talk_layer) {
            return Err(AnimationError::UnknownLayer {
                layer: cfg.talk_layer.clone(),
            }
            .into());
        }
        Ok(())
    }

    pub fn speech_started(&mut self, manager: &mut LayerManager) -> Result<(), HostError> {
        let cfg = &self.config;
        debug!("lipsync start");
        manager.set_layer_weight(
            &cfg.viseme_layer,
            1.0,
            Some(cfg.viseme_blend_time),
            cfg.viseme_easing,
        )?;
        manager.set_layer_weight(
            &cfg.talk_layer,
            1.0,
            Some(cfg.talk_blend_time),
            cfg.talk_easing,
        )?;
        Ok(())
    }

    /// Fade visemes and talk out from wherever they are.
    pub fn speech_stopped(&mut self, manager: &mut LayerManager) -> Result<(), HostError> {
        debug!("lipsync stop");
        self.apply_viseme(manager, None)?;
        let cfg = &self.config;
        manager.set_layer_weight(
            &cfg.viseme_layer,
            0.0,
            Some(cfg.viseme_blend_time),
            cfg.viseme_easing,
        )?;
        manager.set_layer_weight(
            &cfg.talk_layer,
            0.0,
            Some(cfg.talk_blend_time),
            cfg.talk_easing,
        )?;
        Ok(())
    }

    pub fn speech_paused(&mut self, manager: &mut LayerManager) -> Result<(), HostError> {
        manager.pause_animation(&self.config.viseme_layer)?;
        manager.pause_animation(&self.config.talk_layer)?;
        Ok(())
    }

    pub fn speech_resumed(&mut self, manager: &mut LayerManager) -> Result<(), HostError> {
        manager.resume_animation(&self.config.viseme_layer)?;
        manager.resume_animation(&self.config.talk_layer)?;
        Ok(())
    }

    /// Move the blend toward the active viseme. At most the previous and the
    /// new option carry weight; an older option still fading is cut to 0.
    pub fn update(
        &mut self,
        manager: &mut LayerManager,
        active: Option<Viseme>,
    ) -> Result<(), HostError> {
        self.apply_viseme(manager, active)
    }

    fn apply_viseme(
        &mut self,
        manager: &mut LayerManager,
        active: Option<Viseme>,
    ) -> Result<(), HostError> {
        if active == self.current {
            return Ok(());
        }
        let cfg = &self.config;
        if let Some(stale) = self.previous.filter(|v| Some(*v) != active) {
            manager.set_blend_weight(
                &cfg.viseme_layer,
                &cfg.viseme_animation,
                Self::option_name(stale),
                0.0,
                None,
                cfg.viseme_easing,
            )?;
        }
        if let Some(previous) = self.current {
            manager.set_blend_weight(
                &cfg.viseme_layer,
                &cfg.viseme_animation,
                Self::option_name(previous),
                0.0,
                Some(cfg.viseme_blend_time),
                cfg.viseme_easing,
            )?;
        }
        if let Some(next) = active {
            manager.set_blend_weight(
                &cfg.viseme_layer,
                &cfg.viseme_animation,
                Self::option_name(next),
                1.0,
                Some(cfg.viseme_blend_time),
                cfg.viseme_easing,
            )?;
        }
        self.previous = self.current;
        self.current = active;
        Ok(())
    }
}
