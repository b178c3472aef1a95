//! Accumulation of weighted per-target contributions within one override layer.

use hashbrown::HashMap;

use avatar_api_core::blend::normalize_quat;
use avatar_api_core::Value;

/// Weighted sums per Value kind.
/// Quaternions are sign-aligned to the first contribution before summing and
/// normalized at finalize.
#[derive(Clone, Debug)]
enum AccumEntry {
    Float {
        sum: f32,
        w: f32,
    },
    Vec2 {
        sum: [f32; 2],
        w: f32,
    },
    Vec3 {
        sum: [f32; 3],
        w: f32,
    },
    Quat {
        sum: [f32; 4],
        w: f32,
    },
    Transform {
        t_sum: [f32; 3],
        r_sum: [f32; 4],
        s_sum: [f32; 3],
        w: f32,
    },
}

#[inline]
fn add_scaled<const N: usize>(sum: &mut [f32; N], v: &[f32; N], w: f32) {
    for i in 0..N {
        sum[i] += v[i] * w;
    }
}

#[inline]
fn add_quat(sum: &mut [f32; 4], q: &[f32; 4], w: f32) {
    let dot = sum[0] * q[0] + sum[1] * q[1] + sum[2] * q[2] + sum[3] * q[3];
    let sign = if dot < 0.0 { -w } else { w };
    add_scaled(sum, q, sign);
}

#[inline]
fn div<const N: usize>(sum: [f32; N], w: f32) -> [f32; N] {
    let mut out = sum;
    for v in out.iter_mut() {
        *v /= w;
    }
    out
}

impl AccumEntry {
    fn from_value(v: &Value, w: f32) -> Self {
        match v {
            Value::Float(x) => AccumEntry::Float { sum: x * w, w },
            Value::Vec2(a) => AccumEntry::Vec2 {
                sum: [a[0] * w, a[1] * w],
                w,
            },
            Value::Vec3(a) => AccumEntry::Vec3 {
                sum: [a[0] * w, a[1] * w, a[2] * w],
                w,
            },
            Value::Quat(q) => AccumEntry::Quat {
                sum: [q[0] * w, q[1] * w, q[2] * w, q[3] * w],
                w,
            },
            Value::Transform {
                translation,
                rotation,
                scale,
            } => AccumEntry::Transform {
                t_sum: [translation[0] * w, translation[1] * w, translation[2] * w],
                r_sum: [
                    rotation[0] * w,
                    rotation[1] * w,
                    rotation[2] * w,
                    rotation[3] * w,
                ],
                s_sum: [scale[0] * w, scale[1] * w, scale[2] * w],
                w,
            },
        }
    }

    fn add_value(&mut self, v: &Value, w: f32) {
        match (self, v) {
            (AccumEntry::Float { sum, w: ww }, Value::Float(x)) => {
                *sum += x * w;
                *ww += w;
            }
            (AccumEntry::Vec2 { sum, w: ww }, Value::Vec2(a)) => {
                add_scaled(sum, a, w);
                *ww += w;
            }
            (AccumEntry::Vec3 { sum, w: ww }, Value::Vec3(a)) => {
                add_scaled(sum, a, w);
                *ww += w;
            }
            (AccumEntry::Quat { sum, w: ww }, Value::Quat(q)) => {
                add_quat(sum, q, w);
                *ww += w;
            }
            (
                AccumEntry::Transform {
                    t_sum,
                    r_sum,
                    s_sum,
                    w: ww,
                },
                Value::Transform {
                    translation,
                    rotation,
                    scale,
                },
            ) => {
                add_scaled(t_sum, translation, w);
                add_quat(r_sum, rotation, w);
                add_scaled(s_sum, scale, w);
                *ww += w;
            }
            _ => {
                // Mismatched kind; ignore to keep fail-soft behavior.
            }
        }
    }

    fn finalize(self) -> Option<(Value, f32)> {
        match self {
            AccumEntry::Float { sum, w } if w > 0.0 => Some((Value::Float(sum / w), w)),
            AccumEntry::Vec2 { sum, w } if w > 0.0 => Some((Value::Vec2(div(sum, w)), w)),
            AccumEntry::Vec3 { sum, w } if w > 0.0 => Some((Value::Vec3(div(sum, w)), w)),
            AccumEntry::Quat { sum, w } if w > 0.0 => {
                Some((Value::Quat(normalize_quat(div(sum, w))), w))
            }
            AccumEntry::Transform {
                t_sum,
                r_sum,
                s_sum,
                w,
            } if w > 0.0 => Some((
                Value::Transform {
                    translation: div(t_sum, w),
                    rotation: normalize_quat(div(r_sum, w)),
                    scale: div(s_sum, w),
                },
                w,
            )),
            _ => None,
        }
    }
}

/// Accumulates per-target contributions across the sub-clips of a layer.
#[derive(Default, Debug)]
pub struct Accumulator {
    map: HashMap<String, AccumEntry>,
}

impl Accumulator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, target: &str, value: &Value, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        if let Some(entry) = self.map.get_mut(target) {
            entry.add_value(value, weight);
        } else {
            self.map
                .insert(target.to_string(), AccumEntry::from_value(value, weight));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drain into (target, normalized value, total weight) triples, leaving the
    /// accumulator empty for reuse.
    pub fn drain(&mut self) -> impl Iterator<Item = (String, Value, f32)> + '_ {
        self.map
            .drain()
            .filter_map(|(k, e)| e.finalize().map(|(v, w)| (k, v, w)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_average_and_total() {
        let mut acc = Accumulator::default();
        acc.add("x", &Value::Float(0.0), 0.25);
        acc.add("x", &Value::Float(1.0), 0.75);
        acc.add("y", &Value::Float(1.0), 0.0);
        let out: Vec<_> = acc.drain().collect();
        assert_eq!(out.len(), 1);
        let (k, v, w) = &out[0];
        assert_eq!(k, "x");
        assert_eq!(*v, Value::Float(0.75));
        assert_eq!(*w, 1.0);
        assert!(acc.is_empty());
    }

    #[test]
    fn opposite_sign_quats_do_not_cancel() {
        let mut acc = Accumulator::default();
        acc.add("r", &Value::Quat([0.0, 0.0, 0.0, 1.0]), 0.5);
        acc.add("r", &Value::Quat([0.0, 0.0, 0.0, -1.0]), 0.5);
        let (_, v, _) = acc.drain().next().unwrap();
        match v {
            Value::Quat(q) => assert!((q[3].abs() - 1.0).abs() < 1e-5),
            other => panic!("unexpected {other:?}"),
        }
    }
}
