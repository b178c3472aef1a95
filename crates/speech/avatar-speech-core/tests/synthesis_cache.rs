use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::executor::block_on;
use futures::FutureExt;
use parking_lot::Mutex;

use avatar_speech_core::{
    AudioHandle, ProviderOutput, RawMark, SpeechProvider, SpeechSynthesisCache, SynthesisError,
    TimelineBuilder, VoiceConfig,
};

/// Counts calls; pops a scripted outcome per call (success when the script is empty).
#[derive(Default)]
struct ScriptedProvider {
    calls: AtomicUsize,
    script: Mutex<VecDeque<bool>>,
}

impl ScriptedProvider {
    fn with_script(outcomes: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(outcomes.iter().copied().collect()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn synthesize(
        &self,
        text: &str,
        _voice: &VoiceConfig,
    ) -> Result<ProviderOutput, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ok = self.script.lock().pop_front().unwrap_or(true);
        if !ok {
            return Err(SynthesisError::Network {
                reason: "connection reset".into(),
            });
        }
        Ok(ProviderOutput {
            audio: AudioHandle::new("audio/mpeg", text.as_bytes().to_vec()),
            marks: vec![RawMark::word(0.0, text), RawMark::viseme_id(0.0, 6)],
        })
    }
}

fn cache(provider: &Arc<ScriptedProvider>) -> SpeechSynthesisCache {
    SpeechSynthesisCache::new(provider.clone(), TimelineBuilder::default())
}

/// it should share one synthesis between concurrent requests for the same text
#[test]
fn concurrent_requests_share_one_synthesis() {
    let provider = ScriptedProvider::with_script(&[]);
    let cache = cache(&provider);
    let voice = VoiceConfig::default();

    let a = cache.get("hello", &voice, false);
    let b = cache.get("hello", &voice, false);
    let (ra, rb) = block_on(futures::future::join(a, b));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert_eq!(provider.calls(), 1);
    assert!(Arc::ptr_eq(&ra, &rb));
    assert_eq!(ra.timeline.len(), 2);

    // finished entries resolve immediately
    let again = cache.get("hello", &voice, false).now_or_never();
    assert!(matches!(again, Some(Ok(_))));
    assert_eq!(provider.calls(), 1);
}

/// it should start a new synthesis when forced or when the voice differs
#[test]
fn force_and_voice_change_resynthesize() {
    let provider = ScriptedProvider::with_script(&[]);
    let cache = cache(&provider);
    let voice = VoiceConfig::default();

    block_on(cache.get("hi", &voice, false)).unwrap();
    block_on(cache.get("hi", &voice, true)).unwrap();
    assert_eq!(provider.calls(), 2);

    let other = VoiceConfig::new("Joanna", "en-US");
    block_on(cache.get("hi", &other, false)).unwrap();
    assert_eq!(provider.calls(), 3);
    assert!(cache.contains("hi", &other));
    assert!(!cache.contains("hi", &voice));
    assert_eq!(cache.len(), 1);
}

/// it should evict a failed synthesis so the next request retries
#[test]
fn failure_evicts_entry() {
    let provider = ScriptedProvider::with_script(&[false]);
    let cache = cache(&provider);
    let voice = VoiceConfig::default();

    let err = block_on(cache.get("oops", &voice, false)).unwrap_err();
    assert!(err.is_retryable());
    assert!(!cache.contains("oops", &voice));

    block_on(cache.get("oops", &voice, false)).unwrap();
    assert_eq!(provider.calls(), 2);
    assert!(cache.contains("oops", &voice));
}

/// it should not let an older failed request evict a newer forced one
#[test]
fn stale_failure_keeps_newer_entry() {
    let provider = ScriptedProvider::with_script(&[false, true]);
    let cache = cache(&provider);
    let voice = VoiceConfig::default();

    let stale = cache.get("race", &voice, false);
    let fresh = cache.get("race", &voice, true);

    assert!(block_on(stale).is_err());
    assert!(cache.contains("race", &voice));
    assert!(block_on(fresh).is_ok());
    assert_eq!(provider.calls(), 2);
}

#[test]
fn invalidate_and_clear() {
    let provider = ScriptedProvider::with_script(&[]);
    let cache = cache(&provider);
    let voice = VoiceConfig::default();
    let _ = cache.get("a", &voice, false);
    let _ = cache.get("b", &voice, false);
    assert_eq!(cache.len(), 2);
    assert!(cache.invalidate("a"));
    assert!(!cache.invalidate("a"));
    cache.clear();
    assert!(cache.is_empty());
    // nothing was polled
    assert_eq!(provider.calls(), 0);
}
