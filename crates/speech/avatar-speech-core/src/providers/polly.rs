//! Polly-style synthesis: audio and JSON-lines speechmarks come from two
//! requests for the same text, issued concurrently.

use async_trait::async_trait;
use log::warn;
use serde::Deserialize;

use crate::error::SynthesisError;
use crate::provider::{AudioHandle, ProviderOutput, SpeechProvider, VoiceConfig};
use crate::speechmark::RawMark;

/// Whether the request text is SSML or plain text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextType {
    Text,
    Ssml,
}

impl TextType {
    pub fn detect(text: &str) -> Self {
        if text.trim_start().starts_with("<speak") {
            TextType::Ssml
        } else {
            TextType::Text
        }
    }
}

#[async_trait]
pub trait PollyTransport: Send + Sync {
    async fn synthesize_audio(
        &self,
        text: &str,
        text_type: TextType,
        voice: &VoiceConfig,
    ) -> Result<Vec<u8>, SynthesisError>;

    /// Newline-delimited JSON speechmarks for the same request.
    async fn synthesize_speechmarks(
        &self,
        text: &str,
        text_type: TextType,
        voice: &VoiceConfig,
    ) -> Result<String, SynthesisError>;
}

#[derive(Debug)]
pub struct PollySpeechProvider<T> {
    transport: T,
}

impl<T: PollyTransport> PollySpeechProvider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: PollyTransport> SpeechProvider for PollySpeechProvider<T> {
    fn name(&self) -> &str {
        "polly"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
    ) -> Result<ProviderOutput, SynthesisError> {
        let text_type = TextType::detect(text);
        let (audio, marks) = futures::try_join!(
            self.transport.synthesize_audio(text, text_type, voice),
            self.transport.synthesize_speechmarks(text, text_type, voice),
        )?;
        if audio.is_empty() {
            return Err(SynthesisError::InvalidResponse {
                reason: "synthesis returned no audio".into(),
            });
        }
        Ok(ProviderOutput {
            audio: AudioHandle::new("audio/mpeg", audio),
            marks: parse_speechmarks(&marks)?,
        })
    }
}

#[derive(Deserialize)]
struct PollyMark {
    time: f64,
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

/// Parse newline-delimited speechmarks. Blank lines are skipped and unknown
/// mark types are dropped with a warning; malformed JSON fails the response.
pub fn parse_speechmarks(jsonl: &str) -> Result<Vec<RawMark>, SynthesisError> {
    let mut out = Vec::new();
    for (line_no, line) in jsonl.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mark: PollyMark =
            serde_json::from_str(line).map_err(|e| SynthesisError::InvalidResponse {
                reason: format!("speechmark line {}: {e}", line_no + 1),
            })?;
        let raw = match mark.kind.as_str() {
            "viseme" => RawMark::viseme_code(mark.time, mark.value),
            "word" => RawMark::word(mark.time, mark.value),
            "sentence" => RawMark::sentence(mark.time, mark.value),
            "ssml" => RawMark::ssml(mark.time, mark.value),
            other => {
                warn!("dropping speechmark of unknown type '{other}' at {}ms", mark.time);
                continue;
            }
        };
        out.push(raw);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_skips_unknown_types() {
        let input = concat!(
            r#"{"time":0,"type":"sentence","start":0,"end":3,"value":"Hi."}"#,
            "\n\n",
            r#"{"time":5,"type":"viseme","value":"k"}"#,
            "\n",
            r#"{"time":9,"type":"breath","value":"x"}"#,
            "\n",
        );
        let marks = parse_speechmarks(input).unwrap();
        assert_eq!(
            marks,
            vec![RawMark::sentence(0.0, "Hi."), RawMark::viseme_code(5.0, "k")]
        );
    }

    #[test]
    fn malformed_line_is_invalid_response() {
        let err = parse_speechmarks("{\"time\":").unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidResponse { .. }));
    }

    #[test]
    fn detects_ssml() {
        assert_eq!(TextType::detect("  <speak>hi</speak>"), TextType::Ssml);
        assert_eq!(TextType::detect("hi"), TextType::Text);
    }
}
