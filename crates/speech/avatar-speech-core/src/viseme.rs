//! Canonical viseme alphabet (Polly-style codes).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// Mouth shape classes. Serialized as their single-letter codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Viseme {
    #[serde(rename = "sil")]
    Sil,
    /// p, b, m
    #[serde(rename = "p")]
    P,
    /// t, d
    #[serde(rename = "t")]
    T,
    /// ʃ, ʒ, tʃ, dʒ
    #[serde(rename = "S")]
    Sh,
    /// θ, ð
    #[serde(rename = "T")]
    Th,
    /// f, v
    #[serde(rename = "f")]
    F,
    /// k, g, ŋ
    #[serde(rename = "k")]
    K,
    #[serde(rename = "i")]
    I,
    #[serde(rename = "r")]
    R,
    /// s, z
    #[serde(rename = "s")]
    S,
    /// w, u
    #[serde(rename = "u")]
    U,
    /// ə
    #[serde(rename = "@")]
    Schwa,
    #[serde(rename = "a")]
    A,
    #[serde(rename = "e")]
    E,
    /// ɛ
    #[serde(rename = "E")]
    OpenE,
    #[serde(rename = "o")]
    O,
    /// ɔ
    #[serde(rename = "O")]
    OpenO,
}

impl Viseme {
    pub const ALL: [Viseme; 17] = [
        Viseme::Sil,
        Viseme::P,
        Viseme::T,
        Viseme::Sh,
        Viseme::Th,
        Viseme::F,
        Viseme::K,
        Viseme::I,
        Viseme::R,
        Viseme::S,
        Viseme::U,
        Viseme::Schwa,
        Viseme::A,
        Viseme::E,
        Viseme::OpenE,
        Viseme::O,
        Viseme::OpenO,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Viseme::Sil => "sil",
            Viseme::P => "p",
            Viseme::T => "t",
            Viseme::Sh => "S",
            Viseme::Th => "T",
            Viseme::F => "f",
            Viseme::K => "k",
            Viseme::I => "i",
            Viseme::R => "r",
            Viseme::S => "s",
            Viseme::U => "u",
            Viseme::Schwa => "@",
            Viseme::A => "a",
            Viseme::E => "e",
            Viseme::OpenE => "E",
            Viseme::O => "o",
            Viseme::OpenO => "O",
        }
    }

    /// Codes are case-sensitive: `"S"` and `"s"` are different visemes.
    pub fn from_code(code: &str) -> Option<Viseme> {
        Viseme::ALL.into_iter().find(|v| v.code() == code)
    }
}

impl fmt::Display for Viseme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Viseme {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Viseme::from_code(s).ok_or_else(|| SpeechError::UnknownViseme {
            code: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_case_sensitively() {
        for v in Viseme::ALL {
            assert_eq!(Viseme::from_code(v.code()), Some(v));
        }
        assert_eq!("S".parse::<Viseme>().unwrap(), Viseme::Sh);
        assert_eq!("s".parse::<Viseme>().unwrap(), Viseme::S);
        assert!("x".parse::<Viseme>().is_err());
        assert_eq!(serde_json::to_string(&Viseme::Schwa).unwrap(), "\"@\"");
    }
}
