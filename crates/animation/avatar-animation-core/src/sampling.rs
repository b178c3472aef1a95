//! Track sampling for the canonical clip schema.
//!
//! Model:
//! - Each Track has ordered Keypoints with normalized stamps in [0,1].
//! - Segment [Pi -> P(i+1)] timing is a cubic-bezier determined by:
//!   cp0 = Pi.transitions.out or default {x:0.42, y:0.0}
//!   cp1 = P(i+1).transitions.in or default {x:0.58, y:1.0}
//! - Values blend linearly (quaternions nlerp) on the eased time.

use crate::data::{Keypoint, Track};
use crate::interp::functions::bezier_value;
use avatar_api_core::Value;

const DEFAULT_OUT_X: f32 = 0.42;
const DEFAULT_OUT_Y: f32 = 0.0;
const DEFAULT_IN_X: f32 = 0.58;
const DEFAULT_IN_Y: f32 = 1.0;

/// Find the segment [i, i+1] that contains normalized time u, and return (i, i+1, local_t).
/// Edge cases:
/// - If u <= first.stamp, returns (0, 0, 0) and caller should pick points[0].
/// - If u >= last.stamp, returns (last, last, 0) and caller should pick points[last].
fn find_segment(points: &[Keypoint], u: f32) -> (usize, usize, f32) {
    let n = points.len();
    if n == 0 {
        return (0, 0, 0.0);
    }
    if n == 1 || u <= points[0].stamp {
        return (0, 0, 0.0);
    }
    if u >= points[n - 1].stamp {
        return (n - 1, n - 1, 0.0);
    }
    // first index whose stamp is > u; u lies in [i-1, i]
    let i1 = points.partition_point(|p| p.stamp <= u).min(n - 1);
    let i0 = i1 - 1;
    let t0 = points[i0].stamp;
    let t1 = points[i1].stamp;
    let denom = (t1 - t0).max(f32::EPSILON);
    (i0, i1, ((u - t0) / denom).clamp(0.0, 1.0))
}

/// Sample a single track at normalized time u in [0,1]. Empty tracks yield None.
pub fn sample_track(track: &Track, u: f32) -> Option<Value> {
    let points = &track.points;
    match points.len() {
        0 => None,
        1 => Some(points[0].value.clone()),
        _ => {
            let (i0, i1, lt) = find_segment(points, u.clamp(0.0, 1.0));
            if i0 == i1 {
                return Some(points[i0].value.clone());
            }
            let left = &points[i0];
            let right = &points[i1];

            let (x1, y1) = left
                .transitions
                .as_ref()
                .and_then(|t| t.r#out.as_ref())
                .map(|v| (v.x, v.y))
                .unwrap_or((DEFAULT_OUT_X, DEFAULT_OUT_Y));

            let (x2, y2) = right
                .transitions
                .as_ref()
                .and_then(|t| t.r#in.as_ref())
                .map(|v| (v.x, v.y))
                .unwrap_or((DEFAULT_IN_X, DEFAULT_IN_Y));

            Some(bezier_value(&left.value, &right.value, lt, [x1, y1, x2, y2]))
        }
    }
}
