//! Value: sampled channel values that make up a pose.
//! All numeric types use f32.

use serde::{Deserialize, Serialize};

/// Coarse kind tag used for dispatch and validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Float,
    Vec2,
    Vec3,
    Quat,
    Transform,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar float (morph target weight, single joint channel)
    Float(f32),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector (translation, scale)
    Vec3([f32; 3]),

    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// Joint transform with translation, rotation (quat), scale
    Transform {
        translation: [f32; 3],
        rotation: [f32; 4],
        scale: [f32; 3],
    },
}

pub const IDENTITY_QUAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Quat(_) => ValueKind::Quat,
            Value::Transform { .. } => ValueKind::Transform,
        }
    }

    /// Neutral element for additive blending of the same kind.
    pub fn identity_like(&self) -> Value {
        match self {
            Value::Float(_) => Value::Float(0.0),
            Value::Vec2(_) => Value::Vec2([0.0; 2]),
            Value::Vec3(_) => Value::Vec3([0.0; 3]),
            Value::Quat(_) => Value::Quat(IDENTITY_QUAT),
            Value::Transform { .. } => Value::Transform {
                translation: [0.0; 3],
                rotation: IDENTITY_QUAT,
                scale: [1.0; 3],
            },
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn quat(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Quat([x, y, z, w])
    }

    pub fn transform(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Value::Transform {
            translation,
            rotation,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_is_tagged() {
        let v = Value::Vec3([1.0, 2.0, 3.0]);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "Vec3");
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn identity_keeps_kind() {
        let t = Value::transform([1.0; 3], [0.0, 0.7, 0.0, 0.7], [2.0; 3]);
        assert_eq!(t.identity_like().kind(), ValueKind::Transform);
        assert_eq!(Value::Quat([0.0, 1.0, 0.0, 0.0]).identity_like(), Value::Quat(IDENTITY_QUAT));
    }
}
