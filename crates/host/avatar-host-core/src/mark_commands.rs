//! Commands embedded in SSML bookmarks.
//!
//! A bookmark whose value is a JSON object such as
//! `{"feature":"gesture","method":"playGesture","args":["Gesture","wave"]}`
//! is executed when the mark is reached. Any other bookmark value is a plain
//! marker and only surfaces as an event.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::HostError;

#[derive(Clone, Debug, PartialEq)]
pub enum HostCommand {
    PlayGesture {
        layer: String,
        animation: String,
        force: bool,
    },
    StopGesture {
        layer: String,
    },
    SetTarget {
        position: [f32; 3],
    },
    ClearTarget,
}

#[derive(Deserialize)]
struct RawCommand {
    feature: String,
    method: String,
    #[serde(default)]
    args: Vec<JsonValue>,
}

/// Parse one bookmark value. `Ok(None)` for plain markers.
pub fn parse_mark(value: &str) -> Result<Option<HostCommand>, HostError> {
    let trimmed = value.trim();
    if !trimmed.starts_with('{') {
        return Ok(None);
    }
    let invalid = |reason: String| HostError::MarkCommand {
        mark: value.to_string(),
        reason,
    };
    let raw: RawCommand = serde_json::from_str(trimmed).map_err(|e| invalid(e.to_string()))?;
    let str_arg = |i: usize| -> Result<String, HostError> {
        raw.args
            .get(i)
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| invalid(format!("argument {i} must be a string")))
    };

    let command = match (raw.feature.as_str(), raw.method.as_str()) {
        ("gesture", "playGesture") | ("gesture", "playEmote") => {
            // Optional third argument: {"force": bool}
            let force = raw
                .args
                .get(2)
                .and_then(|o| o.get("force"))
                .and_then(JsonValue::as_bool)
                .unwrap_or(false);
            HostCommand::PlayGesture {
                layer: str_arg(0)?,
                animation: str_arg(1)?,
                force,
            }
        }
        ("gesture", "stopGesture") => HostCommand::StopGesture { layer: str_arg(0)? },
        ("pointOfInterest", "setTarget") => {
            let mut position = [0.0f32; 3];
            for (i, slot) in position.iter_mut().enumerate() {
                *slot = raw
                    .args
                    .get(i)
                    .and_then(JsonValue::as_f64)
                    .ok_or_else(|| invalid(format!("argument {i} must be a number")))?
                    as f32;
            }
            HostCommand::SetTarget { position }
        }
        ("pointOfInterest", "clearTarget") => HostCommand::ClearTarget,
        (feature, method) => {
            return Err(invalid(format!("unknown command {feature}.{method}")));
        }
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gesture_and_emote() {
        let cmd = parse_mark(r#"{"feature":"gesture","method":"playGesture","args":["Gesture","wave"]}"#)
            .unwrap();
        assert_eq!(
            cmd,
            Some(HostCommand::PlayGesture {
                layer: "Gesture".into(),
                animation: "wave".into(),
                force: false,
            })
        );
        let cmd = parse_mark(
            r#"{"feature":"gesture","method":"playEmote","args":["Emote","happy",{"force":true}]}"#,
        )
        .unwrap();
        assert!(matches!(cmd, Some(HostCommand::PlayGesture { force: true, .. })));
    }

    #[test]
    fn parses_look_target() {
        let cmd = parse_mark(r#"{"feature":"pointOfInterest","method":"setTarget","args":[1,2.5,3]}"#)
            .unwrap();
        assert_eq!(
            cmd,
            Some(HostCommand::SetTarget {
                position: [1.0, 2.5, 3.0]
            })
        );
    }

    #[test]
    fn plain_markers_and_errors() {
        assert_eq!(parse_mark("chapter-2").unwrap(), None);
        assert!(parse_mark(r#"{"feature":"gesture","method":"dance","args":[]}"#).is_err());
        assert!(parse_mark(r#"{"feature":"gesture","method":"playGesture","args":["Gesture"]}"#).is_err());
        assert!(parse_mark("{not json").is_err());
    }
}
