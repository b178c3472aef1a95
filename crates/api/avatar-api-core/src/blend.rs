//! Blending utilities for Value types.
//! - f32 linear interpolation for floats and vector components
//! - quaternion nlerp/slerp (shortest-arc)
//! - transform TRS blending (translation/scale lerp, rotation nlerp)
//! - additive deltas: extraction against a reference and weighted application

use crate::value::IDENTITY_QUAT;
use crate::Value;

/// Linear interpolation for f32
#[inline]
pub fn lerp_f(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lerp for fixed-size arrays
#[inline]
pub fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp_f(a[i], b[i], t);
    }
    out
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Normalize a quaternion represented as [x,y,z,w]
pub fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let mag = dot4(q, q).sqrt();
    if mag == 0.0 {
        IDENTITY_QUAT
    } else {
        [q[0] / mag, q[1] / mag, q[2] / mag, q[3] / mag]
    }
}

/// Hamilton product a * b.
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Inverse of a unit quaternion (its conjugate).
#[inline]
pub fn quat_inverse(q: [f32; 4]) -> [f32; 4] {
    let n = normalize_quat(q);
    [-n[0], -n[1], -n[2], n[3]]
}

/// Quaternion NLERP with shortest-arc correction.
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize_quat(lerp_array(&a, &b, t))
}

/// Slerp between two unit quaternions q1, q2
pub fn slerp(q1: [f32; 4], q2: [f32; 4], t: f32) -> [f32; 4] {
    let qa = normalize_quat(q1);
    let mut qb = normalize_quat(q2);

    let mut dot = dot4(qa, qb);

    // Take the short path.
    if dot < 0.0 {
        qb = [-qb[0], -qb[1], -qb[2], -qb[3]];
        dot = -dot;
    }

    // Nearly parallel: lerp is accurate and avoids dividing by sin(~0).
    const DOT_THRESHOLD: f32 = 0.9995;
    if dot > DOT_THRESHOLD {
        return normalize_quat(lerp_array(&qa, &qb, t));
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta = theta.sin();
    let sin_theta_0 = theta_0.sin();

    let s0 = ((theta_0 - theta).sin()) / sin_theta_0;
    let s1 = sin_theta / sin_theta_0;

    [
        s0 * qa[0] + s1 * qb[0],
        s0 * qa[1] + s1 * qb[1],
        s0 * qa[2] + s1 * qb[2],
        s0 * qa[3] + s1 * qb[3],
    ]
}

/// Blend two Values of the same kind. Mismatched kinds keep `a` (fail-soft).
pub fn lerp_values(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Float(af), Value::Float(bf)) => Value::Float(lerp_f(*af, *bf, t)),
        (Value::Vec2(aa), Value::Vec2(bb)) => Value::Vec2(lerp_array(aa, bb, t)),
        (Value::Vec3(aa), Value::Vec3(bb)) => Value::Vec3(lerp_array(aa, bb, t)),
        (Value::Quat(aq), Value::Quat(bq)) => Value::Quat(nlerp_quat(*aq, *bq, t)),
        (
            Value::Transform {
                translation: ap,
                rotation: ar,
                scale: ascale,
            },
            Value::Transform {
                translation: bp,
                rotation: br,
                scale: bscale,
            },
        ) => Value::Transform {
            translation: lerp_array(ap, bp, t),
            rotation: nlerp_quat(*ar, *br, t),
            scale: lerp_array(ascale, bscale, t),
        },
        _ => a.clone(),
    }
}

fn sub_array<const N: usize>(a: &[f32; N], b: &[f32; N]) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = a[i] - b[i];
    }
    out
}

fn ratio_array<const N: usize>(a: &[f32; N], b: &[f32; N]) -> [f32; N] {
    let mut out = [1.0f32; N];
    for i in 0..N {
        if b[i] != 0.0 {
            out[i] = a[i] / b[i];
        }
    }
    out
}

/// Delta that, applied additively at full weight on `reference`, reproduces `value`.
/// Translation-like channels subtract, rotations use `value * inverse(reference)`,
/// scales divide.
pub fn additive_delta(value: &Value, reference: &Value) -> Value {
    match (value, reference) {
        (Value::Float(v), Value::Float(r)) => Value::Float(v - r),
        (Value::Vec2(v), Value::Vec2(r)) => Value::Vec2(sub_array(v, r)),
        (Value::Vec3(v), Value::Vec3(r)) => Value::Vec3(sub_array(v, r)),
        (Value::Quat(v), Value::Quat(r)) => {
            Value::Quat(normalize_quat(quat_mul(*v, quat_inverse(*r))))
        }
        (
            Value::Transform {
                translation: vt,
                rotation: vr,
                scale: vs,
            },
            Value::Transform {
                translation: rt,
                rotation: rr,
                scale: rs,
            },
        ) => Value::Transform {
            translation: sub_array(vt, rt),
            rotation: normalize_quat(quat_mul(*vr, quat_inverse(*rr))),
            scale: ratio_array(vs, rs),
        },
        _ => value.identity_like(),
    }
}

/// Apply `delta` on top of `base`, scaled by `weight`.
pub fn apply_additive(base: &Value, delta: &Value, weight: f32) -> Value {
    if weight == 0.0 {
        return base.clone();
    }
    match (base, delta) {
        (Value::Float(b), Value::Float(d)) => Value::Float(b + d * weight),
        (Value::Vec2(b), Value::Vec2(d)) => Value::Vec2([b[0] + d[0] * weight, b[1] + d[1] * weight]),
        (Value::Vec3(b), Value::Vec3(d)) => Value::Vec3([
            b[0] + d[0] * weight,
            b[1] + d[1] * weight,
            b[2] + d[2] * weight,
        ]),
        (Value::Quat(b), Value::Quat(d)) => {
            let scaled = slerp(IDENTITY_QUAT, *d, weight);
            Value::Quat(normalize_quat(quat_mul(scaled, *b)))
        }
        (
            Value::Transform {
                translation: bt,
                rotation: br,
                scale: bs,
            },
            Value::Transform {
                translation: dt,
                rotation: dr,
                scale: ds,
            },
        ) => {
            let scaled = slerp(IDENTITY_QUAT, *dr, weight);
            Value::Transform {
                translation: [
                    bt[0] + dt[0] * weight,
                    bt[1] + dt[1] * weight,
                    bt[2] + dt[2] * weight,
                ],
                rotation: normalize_quat(quat_mul(scaled, *br)),
                scale: [
                    bs[0] * lerp_f(1.0, ds[0], weight),
                    bs[1] * lerp_f(1.0, ds[1], weight),
                    bs[2] * lerp_f(1.0, ds[2], weight),
                ],
            }
        }
        _ => base.clone(),
    }
}
