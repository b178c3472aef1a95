//! Azure-style synthesis: SSML in, audio plus viseme/bookmark events with
//! offsets in 100ns ticks out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;
use crate::provider::{AudioHandle, ProviderOutput, SpeechProvider, VoiceConfig};
use crate::speechmark::RawMark;

pub const TICKS_PER_MS: f64 = 10_000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AzureEvent {
    Viseme {
        audio_offset_ticks: u64,
        viseme_id: u32,
    },
    Word {
        audio_offset_ticks: u64,
        text: String,
    },
    /// `<bookmark mark="..."/>` reached; surfaced as an SSML mark.
    Bookmark {
        audio_offset_ticks: u64,
        text: String,
    },
}

impl AzureEvent {
    pub fn offset_ms(&self) -> f64 {
        let ticks = match self {
            AzureEvent::Viseme {
                audio_offset_ticks, ..
            }
            | AzureEvent::Word {
                audio_offset_ticks, ..
            }
            | AzureEvent::Bookmark {
                audio_offset_ticks, ..
            } => *audio_offset_ticks,
        };
        ticks as f64 / TICKS_PER_MS
    }

    pub fn into_raw(self) -> RawMark {
        let time_ms = self.offset_ms();
        match self {
            AzureEvent::Viseme { viseme_id, .. } => RawMark::viseme_id(time_ms, viseme_id),
            AzureEvent::Word { text, .. } => RawMark::word(time_ms, text),
            AzureEvent::Bookmark { text, .. } => RawMark::ssml(time_ms, text),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AzureSynthesis {
    pub audio: Vec<u8>,
    pub content_type: String,
    /// Events in delivery order.
    pub events: Vec<AzureEvent>,
}

#[async_trait]
pub trait AzureTransport: Send + Sync {
    async fn speak_ssml(&self, ssml: &str) -> Result<AzureSynthesis, SynthesisError>;
}

#[derive(Debug)]
pub struct AzureSpeechProvider<T> {
    transport: T,
}

impl<T: AzureTransport> AzureSpeechProvider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: AzureTransport> SpeechProvider for AzureSpeechProvider<T> {
    fn name(&self) -> &str {
        "azure"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
    ) -> Result<ProviderOutput, SynthesisError> {
        let ssml = build_ssml(text, voice);
        let synthesis = self.transport.speak_ssml(&ssml).await?;
        if synthesis.audio.is_empty() {
            return Err(SynthesisError::InvalidResponse {
                reason: "synthesis returned no audio".into(),
            });
        }
        let content_type = if synthesis.content_type.is_empty() {
            "audio/mpeg".to_string()
        } else {
            synthesis.content_type
        };
        Ok(ProviderOutput {
            audio: AudioHandle::new(content_type, synthesis.audio),
            marks: synthesis
                .events
                .into_iter()
                .map(AzureEvent::into_raw)
                .collect(),
        })
    }
}

/// Wrap `text` (plain text or Polly-flavored SSML) in an Azure SSML document:
/// `<speak>` and `<amazon:domain>` wrappers are removed and whitespace collapsed.
pub fn build_ssml(text: &str, voice: &VoiceConfig) -> String {
    let body = strip_tag(&strip_tag(text, "speak"), "amazon:domain");
    let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(
        r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="{}"><voice name="{}">{}</voice></speak>"#,
        voice.language, voice.name, body
    )
}

/// Remove every opening (with any attributes) and closing `name` tag.
fn strip_tag(input: &str, name: &str) -> String {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix(close.as_str()) {
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix(open.as_str()) {
            let boundary = after.chars().next();
            if matches!(boundary, Some('>') | Some('/') | Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
                if let Some(end) = after.find('>') {
                    rest = &after[end + 1..];
                    continue;
                }
            }
        }
        out.push('<');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidies_polly_ssml() {
        let voice = VoiceConfig::new("en-US-AriaNeural", "en-US");
        let text = "<speak>\n<amazon:domain name=\"conversational\">Hello\n  <bookmark mark='x'/> there</amazon:domain></speak>";
        assert_eq!(
            build_ssml(text, &voice),
            "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"en-US\"><voice name=\"en-US-AriaNeural\">Hello <bookmark mark='x'/> there</voice></speak>"
        );
    }

    #[test]
    fn strip_keeps_similar_tags() {
        assert_eq!(strip_tag("<speaker>a</speaker>", "speak"), "<speaker>a</speaker>");
        assert_eq!(strip_tag("<speak xml:lang='en'>a</speak>", "speak"), "a");
    }

    #[test]
    fn offsets_convert_from_ticks() {
        let raw = AzureEvent::Viseme {
            audio_offset_ticks: 1_200_000,
            viseme_id: 19,
        }
        .into_raw();
        assert_eq!(raw, RawMark::viseme_id(120.0, 19));
    }
}
