//! The provider seam: anything that turns text into audio plus timing events.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SynthesisError;
use crate::speechmark::RawMark;

/// Voice selection for one request. Part of the synthesis cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Provider voice name (e.g. "en-US-AriaNeural", "Joanna").
    pub name: String,
    /// BCP-47 language/region code.
    pub language: String,
    /// Provider engine selector, e.g. "neural".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl VoiceConfig {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            engine: None,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self::new("en-US-AriaNeural", "en-US")
    }
}

/// Encoded audio for one utterance. Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioHandle {
    pub id: Uuid,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl AudioHandle {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioHandle")
            .field("id", &self.id)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What a provider hands back before the timeline is built.
#[derive(Clone, Debug)]
pub struct ProviderOutput {
    pub audio: AudioHandle,
    pub marks: Vec<RawMark>,
}

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
    ) -> Result<ProviderOutput, SynthesisError>;
}
