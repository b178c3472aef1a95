//! Interpolation helpers:
//! - cubic-bezier timing curves (x inverted by bisection)
//! - bezier_value (eased time -> linear/nlerp value blend)

use avatar_api_core::blend::lerp_values;
use avatar_api_core::Value;

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
pub fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

/// Bezier easing across Value kinds: compute eased t, then use linear blend.
/// Control points are (x1, y1, x2, y2).
#[inline]
pub fn bezier_value(a: &Value, b: &Value, t: f32, ctrl: [f32; 4]) -> Value {
    let eased = bezier_ease_t(t, ctrl[0], ctrl[1], ctrl[2], ctrl[3]);
    lerp_values(a, b, eased)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_is_pinned_at_ends_and_monotonic() {
        let mut last = -1.0;
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let y = bezier_ease_t(t, 0.42, 0.0, 0.58, 1.0);
            assert!(y >= last - 1e-5, "not monotonic at {t}");
            last = y;
        }
        assert!(bezier_ease_t(0.0, 0.42, 0.0, 0.58, 1.0).abs() < 1e-4);
        assert!((bezier_ease_t(1.0, 0.42, 0.0, 0.58, 1.0) - 1.0).abs() < 1e-4);
    }
}
