use serde::Deserialize;

use crate::data::{AnimationClip, Keypoint, Track, Transitions};
use crate::error::AnimationError;
use avatar_api_core::Value;

/// Parse stored-animation JSON into the canonical [`AnimationClip`].
///
/// Notes:
/// - Duration is given in milliseconds and kept as milliseconds (duration_ms).
/// - Keypoint stamps are normalized [0,1] and kept normalized.
/// - Per-keypoint transitions { in?, out? } are preserved; defaults are applied at sampling time.
/// - Values may be plain numbers, {x,y}, {x,y,z}, {x,y,z,w}, Euler {r,p,y} (radians,
///   converted to a quaternion) or an already tagged `Value`.
pub fn parse_clip_json(s: &str) -> Result<AnimationClip, AnimationError> {
    let sa: StoredAnimation = serde_json::from_str(s).map_err(|e| AnimationError::ClipJson {
        reason: e.to_string(),
    })?;

    let mut tracks: Vec<Track> = Vec::with_capacity(sa.tracks.len());
    for st in sa.tracks {
        let points = st
            .points
            .into_iter()
            .map(|p| Keypoint {
                id: p.id,
                stamp: p.stamp as f32,
                value: p.value.into_value(),
                transitions: p.transitions,
            })
            .collect();
        tracks.push(Track {
            id: st.id,
            name: st.name,
            target: st.target,
            points,
        });
    }

    let clip = AnimationClip {
        name: sa.name,
        tracks,
        duration_ms: sa.duration.min(u32::MAX as u64) as u32,
    };
    clip.validate()?;
    Ok(clip)
}

/// Intrinsic XYZ Euler angles (radians) to an xyzw quaternion.
fn euler_to_quat(r: f32, p: f32, y: f32) -> [f32; 4] {
    let (sr, cr) = (r * 0.5).sin_cos();
    let (sp, cp) = (p * 0.5).sin_cos();
    let (sy, cy) = (y * 0.5).sin_cos();
    [
        sr * cp * cy + cr * sp * sy,
        cr * sp * cy - sr * cp * sy,
        cr * cp * sy + sr * sp * cy,
        cr * cp * cy - sr * sp * sy,
    ]
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct StoredAnimation {
    pub name: String,
    pub tracks: Vec<SaTrack>,
    pub duration: u64, // milliseconds
}

#[derive(Debug, Deserialize)]
struct SaTrack {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "animatableId", alias = "target")]
    pub target: String,
    pub points: Vec<SaPoint>,
}

#[derive(Debug, Deserialize)]
struct SaPoint {
    pub id: String,
    pub stamp: f64, // 0..1
    pub value: RawValue,
    #[serde(default)]
    pub transitions: Option<Transitions>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Tagged(Value),
    Number(f64),
    // Put more specific shapes BEFORE less specific to avoid untagged matching pitfalls.
    Quaternion { x: f64, y: f64, z: f64, w: f64 },
    Vector3 { x: f64, y: f64, z: f64 },
    Vector2 { x: f64, y: f64 },
    Euler { r: f64, p: f64, y: f64 },
}

impl RawValue {
    fn into_value(self) -> Value {
        match self {
            RawValue::Tagged(v) => v,
            RawValue::Number(n) => Value::Float(n as f32),
            RawValue::Quaternion { x, y, z, w } => {
                Value::Quat([x as f32, y as f32, z as f32, w as f32])
            }
            RawValue::Vector3 { x, y, z } => Value::Vec3([x as f32, y as f32, z as f32]),
            RawValue::Vector2 { x, y } => Value::Vec2([x as f32, y as f32]),
            RawValue::Euler { r, p, y } => Value::Quat(euler_to_quat(r as f32, p as f32, y as f32)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_value_shapes() {
        let json = r#"{
            "name": "nod",
            "duration": 800,
            "tracks": [
                { "id": "t0", "name": "jaw", "animatableId": "jaw.open",
                  "points": [ { "id": "a", "stamp": 0.0, "value": 0 },
                              { "id": "b", "stamp": 1.0, "value": 0.5,
                                "transitions": { "in": { "x": 1.0, "y": 1.0 } } } ] },
                { "id": "t1", "name": "head", "animatableId": "head.rotation",
                  "points": [ { "id": "c", "stamp": 0.5, "value": { "r": 0.0, "p": 0.0, "y": 0.0 } } ] }
            ]
        }"#;
        let clip = parse_clip_json(json).unwrap();
        assert_eq!(clip.duration_ms, 800);
        assert_eq!(clip.tracks[0].target, "jaw.open");
        assert_eq!(clip.tracks[0].points[1].value, Value::Float(0.5));
        assert_eq!(clip.tracks[1].points[0].value, Value::Quat([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn rejects_bad_stamps() {
        let json = r#"{ "name": "x", "duration": 100, "tracks": [
            { "id": "t", "animatableId": "a",
              "points": [ { "id": "k", "stamp": 1.5, "value": 1 } ] } ] }"#;
        assert!(matches!(
            parse_clip_json(json),
            Err(AnimationError::InvalidClip { .. })
        ));
        assert!(matches!(
            parse_clip_json("{"),
            Err(AnimationError::ClipJson { .. })
        ));
    }
}
