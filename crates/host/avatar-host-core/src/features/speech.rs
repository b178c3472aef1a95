//! Speech feature: utterance lifecycle from synthesis request to audio end.
//!
//! Elapsed time always comes from the audio player. Syntheses abandoned by
//! `stop` or a newer `speak` are kept as orphans and polled until they
//! resolve, then discarded.

use std::sync::Arc;

use avatar_speech_core::{
    AudioPlayback, MarkPayload, SpeechProvider, SpeechSynthesisCache, SpeechmarkScheduler,
    SynthesisFuture, SynthesisResult, TimelineBuilder, Viseme, VoiceConfig,
};
use futures::FutureExt;
use log::{debug, warn};
use uuid::Uuid;

use crate::events::HostEvent;

struct Pending {
    utterance: Uuid,
    future: SynthesisFuture,
}

enum SpeechState {
    Idle,
    Synthesizing(Pending),
    /// Audio handed to the player, waiting for it to report ready.
    Loading {
        utterance: Uuid,
        result: Arc<SynthesisResult>,
    },
    Playing { utterance: Uuid },
    Paused { utterance: Uuid },
}

/// What happened to speech during one frame, for the features that follow it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpeechUpdate {
    pub started: bool,
    /// Ended, failed, or stopped; dependent layers should fade out.
    pub stopped: bool,
    pub viseme: Option<Viseme>,
    /// SSML mark values reached this frame, in time order.
    pub ssml: Vec<String>,
}

pub struct SpeechFeature {
    cache: SpeechSynthesisCache,
    scheduler: SpeechmarkScheduler,
    audio: Box<dyn AudioPlayback>,
    voice: VoiceConfig,
    state: SpeechState,
    orphans: Vec<Pending>,
    /// Set by control calls between frames, reported by the next update.
    stopped_since_update: bool,
}

impl std::fmt::Debug for SpeechFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechFeature")
            .field("cache", &self.cache)
            .field("voice", &self.voice)
            .field("current", &self.current_utterance())
            .field("orphans", &self.orphans.len())
            .finish()
    }
}

impl SpeechFeature {
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        audio: Box<dyn AudioPlayback>,
        builder: TimelineBuilder,
        voice: VoiceConfig,
    ) -> Self {
        Self {
            cache: SpeechSynthesisCache::new(provider, builder.clone()),
            scheduler: SpeechmarkScheduler::new(builder),
            audio,
            voice,
            state: SpeechState::Idle,
            orphans: Vec::new(),
            stopped_since_update: false,
        }
    }

    pub fn cache(&self) -> &SpeechSynthesisCache {
        &self.cache
    }

    pub fn scheduler(&self) -> &SpeechmarkScheduler {
        &self.scheduler
    }

    pub fn audio(&self) -> &dyn AudioPlayback {
        self.audio.as_ref()
    }

    pub fn voice(&self) -> &VoiceConfig {
        &self.voice
    }

    pub fn set_voice(&mut self, voice: VoiceConfig) {
        self.voice = voice;
    }

    pub fn current_utterance(&self) -> Option<Uuid> {
        match &self.state {
            SpeechState::Idle => None,
            SpeechState::Synthesizing(p) => Some(p.utterance),
            SpeechState::Loading { utterance, .. }
            | SpeechState::Playing { utterance }
            | SpeechState::Paused { utterance } => Some(*utterance),
        }
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self.state, SpeechState::Playing { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, SpeechState::Paused { .. })
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Request `text` with the default voice. Any current utterance stops.
    pub fn speak(&mut self, text: &str, events: &mut Vec<HostEvent>) -> Uuid {
        let voice = self.voice.clone();
        self.speak_with(text, &voice, false, events)
    }

    pub fn speak_with(
        &mut self,
        text: &str,
        voice: &VoiceConfig,
        force: bool,
        events: &mut Vec<HostEvent>,
    ) -> Uuid {
        self.stop(events);
        let utterance = Uuid::new_v4();
        let future = self.cache.get(text, voice, force);
        debug!("utterance {utterance} requested");
        self.state = SpeechState::Synthesizing(Pending { utterance, future });
        utterance
    }

    pub fn pause(&mut self, events: &mut Vec<HostEvent>) -> bool {
        let SpeechState::Playing { utterance } = self.state else {
            return false;
        };
        self.audio.pause();
        self.state = SpeechState::Paused { utterance };
        events.push(HostEvent::SpeechPause { utterance });
        true
    }

    pub fn resume(&mut self, events: &mut Vec<HostEvent>) -> bool {
        let SpeechState::Paused { utterance } = self.state else {
            return false;
        };
        self.audio.resume();
        self.state = SpeechState::Playing { utterance };
        events.push(HostEvent::SpeechResume { utterance });
        true
    }

    /// Stop the current utterance. A synthesis still in flight becomes an orphan.
    pub fn stop(&mut self, events: &mut Vec<HostEvent>) -> bool {
        let utterance = match std::mem::replace(&mut self.state, SpeechState::Idle) {
            SpeechState::Idle => return false,
            SpeechState::Synthesizing(pending) => {
                let utterance = pending.utterance;
                debug!("utterance {utterance} orphaned while synthesizing");
                self.orphans.push(pending);
                utterance
            }
            SpeechState::Loading { utterance, .. }
            | SpeechState::Playing { utterance }
            | SpeechState::Paused { utterance } => {
                self.audio.stop();
                self.scheduler.cancel();
                utterance
            }
        };
        self.stopped_since_update = true;
        events.push(HostEvent::SpeechStop { utterance });
        true
    }

    /// Advance one frame: poll synthesis, drive the player, fire marks.
    pub fn update(&mut self, dt: f32, events: &mut Vec<HostEvent>) -> SpeechUpdate {
        let mut update = SpeechUpdate {
            stopped: std::mem::take(&mut self.stopped_since_update),
            ..SpeechUpdate::default()
        };
        self.poll_orphans();

        if let SpeechState::Synthesizing(pending) = &self.state {
            let utterance = pending.utterance;
            match pending.future.clone().now_or_never() {
                None => {}
                Some(Ok(result)) => {
                    for issue in &result.issues {
                        debug!("utterance {utterance}: {issue}");
                    }
                    match self.audio.load(&result.audio) {
                        Ok(()) => self.state = SpeechState::Loading { utterance, result },
                        Err(error) => {
                            warn!("utterance {utterance} audio load failed: {error}");
                            self.state = SpeechState::Idle;
                            update.stopped = true;
                            events.push(HostEvent::AudioFailed { utterance, error });
                        }
                    }
                }
                Some(Err(error)) => {
                    warn!("utterance {utterance} synthesis failed: {error}");
                    self.state = SpeechState::Idle;
                    update.stopped = true;
                    events.push(HostEvent::SynthesisFailed { utterance, error });
                }
            }
        }

        if let SpeechState::Loading { utterance, result } = &self.state {
            let utterance = *utterance;
            if self.audio.is_ready() {
                match self.audio.play() {
                    Ok(()) => {
                        self.scheduler.load(result.timeline.clone());
                        self.state = SpeechState::Playing { utterance };
                        update.started = true;
                        events.push(HostEvent::SpeechPlay { utterance });
                    }
                    Err(error) => {
                        warn!("utterance {utterance} playback failed: {error}");
                        self.state = SpeechState::Idle;
                        update.stopped = true;
                        events.push(HostEvent::AudioFailed { utterance, error });
                    }
                }
            }
        }

        match self.state {
            SpeechState::Playing { utterance } => {
                self.audio.tick(f64::from(dt) * 1000.0);
                let elapsed = self.audio.current_time_ms();
                for mark in self.scheduler.advance(elapsed) {
                    let time_ms = mark.time_ms;
                    events.push(match mark.payload {
                        MarkPayload::Sentence(text) => HostEvent::Sentence {
                            utterance,
                            text,
                            time_ms,
                        },
                        MarkPayload::Word(text) => HostEvent::Word {
                            utterance,
                            text,
                            time_ms,
                        },
                        MarkPayload::Viseme(viseme) => HostEvent::Viseme {
                            utterance,
                            viseme,
                            time_ms,
                            duration_ms: mark.duration_ms,
                        },
                        MarkPayload::Ssml(value) => {
                            update.ssml.push(value.clone());
                            HostEvent::Ssml {
                                utterance,
                                value,
                                time_ms,
                            }
                        }
                    });
                }
                if self.audio.has_ended() {
                    debug!("utterance {utterance} ended");
                    self.scheduler.cancel();
                    self.state = SpeechState::Idle;
                    update.started = false;
                    update.stopped = true;
                    events.push(HostEvent::SpeechEnd { utterance });
                } else {
                    update.viseme = self
                        .scheduler
                        .query(elapsed)
                        .viseme
                        .and_then(|m| m.viseme());
                }
            }
            SpeechState::Paused { .. } => {
                update.viseme = self
                    .scheduler
                    .query(self.audio.current_time_ms())
                    .viseme
                    .and_then(|m| m.viseme());
            }
            _ => {}
        }

        update
    }

    fn poll_orphans(&mut self) {
        self.orphans.retain(|orphan| {
            match orphan.future.clone().now_or_never() {
                None => true,
                Some(outcome) => {
                    debug!(
                        "orphaned utterance {} resolved ({}), discarded",
                        orphan.utterance,
                        if outcome.is_ok() { "ok" } else { "failed" }
                    );
                    false
                }
            }
        });
    }
}
