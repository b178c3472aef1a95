//! Pose: per-target values produced each frame, and the sink that receives them.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::Value;

/// Final blended values keyed by target path (e.g. "chest.rotation").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    values: HashMap<String, Value>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, target: &str) -> Option<&Value> {
        self.values.get(target)
    }

    #[inline]
    pub fn set(&mut self, target: impl Into<String>, value: Value) {
        self.values.insert(target.into(), value);
    }

    pub fn remove(&mut self, target: &str) -> Option<Value> {
        self.values.remove(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Replace contents with `other` while keeping this map's allocation.
    pub fn copy_from(&mut self, other: &Pose) {
        self.values.clear();
        for (k, v) in other.values.iter() {
            self.values.insert(k.clone(), v.clone());
        }
    }
}

impl FromIterator<(String, Value)> for Pose {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Scene collaborator receiving the composed pose once per frame.
/// Implemented by engine adapters; the animation core never touches a scene graph directly.
pub trait PoseSink {
    fn apply_pose(&mut self, pose: &Pose);
}
