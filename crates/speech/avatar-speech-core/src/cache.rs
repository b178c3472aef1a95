//! Deduplicating cache of in-flight and finished syntheses, keyed by text.

use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use hashbrown::HashMap;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::{SynthesisError, TimelineInconsistency};
use crate::provider::{AudioHandle, SpeechProvider, VoiceConfig};
use crate::timeline::{Timeline, TimelineBuilder};

#[derive(Debug)]
pub struct SynthesisResult {
    pub audio: AudioHandle,
    pub timeline: Timeline,
    /// Marks dropped or replaced while the timeline was built.
    pub issues: Vec<TimelineInconsistency>,
}

pub type SynthesisOutcome = Result<Arc<SynthesisResult>, SynthesisError>;

/// Cloneable handle on one synthesis; every clone resolves to the same outcome.
pub type SynthesisFuture = Shared<BoxFuture<'static, SynthesisOutcome>>;

struct CacheSlot {
    voice: VoiceConfig,
    generation: u64,
    future: SynthesisFuture,
}

#[derive(Default)]
struct Slots {
    map: HashMap<String, CacheSlot>,
    next_generation: u64,
}

/// At most one non-forced synthesis per (text, voice) is in flight or cached.
/// The lock is held only for slot lookup, insert and eviction.
pub struct SpeechSynthesisCache {
    provider: Arc<dyn SpeechProvider>,
    builder: TimelineBuilder,
    slots: Arc<Mutex<Slots>>,
}

impl std::fmt::Debug for SpeechSynthesisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesisCache")
            .field("provider", &self.provider.name())
            .field("entries", &self.len())
            .finish()
    }
}

impl SpeechSynthesisCache {
    pub fn new(provider: Arc<dyn SpeechProvider>, builder: TimelineBuilder) -> Self {
        Self {
            provider,
            builder,
            slots: Arc::new(Mutex::new(Slots::default())),
        }
    }

    pub fn provider(&self) -> &Arc<dyn SpeechProvider> {
        &self.provider
    }

    /// Return the shared synthesis for `text`. An existing entry with the same
    /// voice is reused unless `force` is set; otherwise a new synthesis
    /// replaces the slot.
    pub fn get(&self, text: &str, voice: &VoiceConfig, force: bool) -> SynthesisFuture {
        let mut slots = self.slots.lock();
        if !force {
            if let Some(slot) = slots.map.get(text) {
                if slot.voice == *voice {
                    debug!("reusing synthesis for {:?}", preview(text));
                    return slot.future.clone();
                }
            }
        }

        let generation = slots.next_generation;
        slots.next_generation += 1;
        let future = self.start(text.to_string(), voice.clone(), generation);
        slots.map.insert(
            text.to_string(),
            CacheSlot {
                voice: voice.clone(),
                generation,
                future: future.clone(),
            },
        );
        debug!(
            "starting synthesis {generation} for {:?} with {}",
            preview(text),
            self.provider.name()
        );
        future
    }

    fn start(&self, text: String, voice: VoiceConfig, generation: u64) -> SynthesisFuture {
        let provider = Arc::clone(&self.provider);
        let builder = self.builder.clone();
        let slots: Weak<Mutex<Slots>> = Arc::downgrade(&self.slots);
        async move {
            match provider.synthesize(&text, &voice).await {
                Ok(output) => {
                    let (timeline, issues) = builder.build(output.marks);
                    Ok(Arc::new(SynthesisResult {
                        audio: output.audio,
                        timeline,
                        issues,
                    }))
                }
                Err(err) => {
                    evict_generation(&slots, &text, generation, &err);
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }

    pub fn invalidate(&self, text: &str) -> bool {
        self.slots.lock().map.remove(text).is_some()
    }

    pub fn clear(&self) {
        self.slots.lock().map.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, text: &str, voice: &VoiceConfig) -> bool {
        self.slots
            .lock()
            .map
            .get(text)
            .is_some_and(|slot| slot.voice == *voice)
    }
}

/// Remove the slot for `text` only if it still belongs to `generation`; a
/// newer forced request must not be evicted by an older failure.
fn evict_generation(slots: &Weak<Mutex<Slots>>, text: &str, generation: u64, err: &SynthesisError) {
    let Some(slots) = slots.upgrade() else {
        return;
    };
    let mut slots = slots.lock();
    if slots.map.get(text).map(|s| s.generation) == Some(generation) {
        slots.map.remove(text);
        warn!("synthesis for {:?} failed, entry evicted: {err}", preview(text));
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 32;
    match text.char_indices().nth(MAX) {
        Some((i, _)) => format!("{}…", &text[..i]),
        None => text.to_string(),
    }
}
