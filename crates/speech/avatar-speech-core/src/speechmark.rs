//! Speechmarks: typed, time-anchored events attached to synthesized speech.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::viseme::Viseme;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Sentence,
    Word,
    Viseme,
    Ssml,
}

impl MarkType {
    pub const ALL: [MarkType; 4] = [
        MarkType::Sentence,
        MarkType::Word,
        MarkType::Viseme,
        MarkType::Ssml,
    ];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarkType::Sentence => "sentence",
            MarkType::Word => "word",
            MarkType::Viseme => "viseme",
            MarkType::Ssml => "ssml",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MarkPayload {
    Sentence(String),
    Word(String),
    Viseme(Viseme),
    Ssml(String),
}

/// A normalized mark on a [`crate::Timeline`]. `duration_ms > 0` once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Speechmark {
    pub time_ms: f64,
    pub duration_ms: f64,
    pub payload: MarkPayload,
}

impl Speechmark {
    pub fn mark_type(&self) -> MarkType {
        match self.payload {
            MarkPayload::Sentence(_) => MarkType::Sentence,
            MarkPayload::Word(_) => MarkType::Word,
            MarkPayload::Viseme(_) => MarkType::Viseme,
            MarkPayload::Ssml(_) => MarkType::Ssml,
        }
    }

    pub fn end_ms(&self) -> f64 {
        self.time_ms + self.duration_ms
    }

    /// `time <= t < time + duration`
    pub fn contains(&self, t_ms: f64) -> bool {
        self.time_ms <= t_ms && t_ms < self.end_ms()
    }

    pub fn viseme(&self) -> Option<Viseme> {
        match self.payload {
            MarkPayload::Viseme(v) => Some(v),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            MarkPayload::Sentence(s) | MarkPayload::Word(s) | MarkPayload::Ssml(s) => Some(s),
            MarkPayload::Viseme(_) => None,
        }
    }
}

/// Provider viseme before translation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawViseme {
    /// Numeric provider id, translated through a crosswalk.
    Id(u32),
    /// Canonical code already (Polly-style providers).
    Code(String),
}

/// Provider timing event, as delivered, before the timeline is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RawPayload {
    Sentence(String),
    Word(String),
    Viseme(RawViseme),
    Ssml(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawMark {
    pub time_ms: f64,
    pub payload: RawPayload,
}

impl RawMark {
    pub fn viseme_id(time_ms: f64, id: u32) -> Self {
        Self {
            time_ms,
            payload: RawPayload::Viseme(RawViseme::Id(id)),
        }
    }

    pub fn viseme_code(time_ms: f64, code: impl Into<String>) -> Self {
        Self {
            time_ms,
            payload: RawPayload::Viseme(RawViseme::Code(code.into())),
        }
    }

    pub fn word(time_ms: f64, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            payload: RawPayload::Word(text.into()),
        }
    }

    pub fn sentence(time_ms: f64, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            payload: RawPayload::Sentence(text.into()),
        }
    }

    pub fn ssml(time_ms: f64, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            payload: RawPayload::Ssml(text.into()),
        }
    }

    pub fn mark_type(&self) -> MarkType {
        match self.payload {
            RawPayload::Sentence(_) => MarkType::Sentence,
            RawPayload::Word(_) => MarkType::Word,
            RawPayload::Viseme(_) => MarkType::Viseme,
            RawPayload::Ssml(_) => MarkType::Ssml,
        }
    }
}
