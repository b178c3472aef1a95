use std::sync::Arc;

use avatar_api_core::Value;

use crate::clip_player::ClipPlayer;
use crate::data::AnimationClip;

use super::StateProgress;

const POINT_EPSILON: f32 = 1e-6;
const AREA_EPSILON: f32 = 1e-6;
const INSIDE_TOLERANCE: f32 = 1e-5;

#[derive(Clone, Debug)]
pub struct Blend2dOption {
    pub name: String,
    pub clip: Arc<AnimationClip>,
    /// Reference position of this option on the blend plane.
    pub point: [f32; 2],
}

impl Blend2dOption {
    pub fn new(name: impl Into<String>, clip: Arc<AnimationClip>, point: [f32; 2]) -> Self {
        Self {
            name: name.into(),
            clip,
            point,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Blend2dState {
    names: Vec<String>,
    points: Vec<[f32; 2]>,
    players: Vec<ClipPlayer>,
    /// Non-degenerate index triples with their absolute area.
    triangles: Vec<([usize; 3], f32)>,
    parameter: [f32; 2],
    weights: Vec<f32>,
}

impl Blend2dState {
    pub(crate) fn new(options: Vec<Blend2dOption>, parameter: [f32; 2]) -> Self {
        let points: Vec<[f32; 2]> = options.iter().map(|o| o.point).collect();
        let triangles = triangles(&points);
        let mut state = Self {
            names: options.iter().map(|o| o.name.clone()).collect(),
            players: options
                .into_iter()
                .map(|o| ClipPlayer::new(o.clip, None))
                .collect(),
            weights: vec![0.0; points.len()],
            points,
            triangles,
            parameter,
        };
        state.set_parameter(parameter);
        state
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn parameter(&self) -> [f32; 2] {
        self.parameter
    }

    pub fn weight(&self, option: &str) -> Option<f32> {
        self.names
            .iter()
            .position(|n| n == option)
            .map(|i| self.weights[i])
    }

    pub fn weights(&self) -> impl Iterator<Item = (&str, f32)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    pub(crate) fn set_parameter(&mut self, parameter: [f32; 2]) {
        self.parameter = parameter;
        self.weights = compute_weights(&self.points, &self.triangles, parameter);
    }

    pub(crate) fn restart(&mut self) {
        for player in &mut self.players {
            player.restart(None);
        }
    }

    pub(crate) fn advance(&mut self, dt: f32) -> StateProgress {
        for player in &mut self.players {
            player.advance(dt);
        }
        StateProgress::Running
    }

    pub(crate) fn sample(&self, emit: &mut dyn FnMut(&str, Value, f32)) {
        for (player, &w) in self.players.iter().zip(&self.weights) {
            if w > 0.0 {
                player.sample(&mut |target, value| emit(target, value, w));
            }
        }
    }
}

fn signed_area(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]))
}

fn triangles(points: &[[f32; 2]]) -> Vec<([usize; 3], f32)> {
    let n = points.len();
    let mut out = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let area = signed_area(points[i], points[j], points[k]).abs();
                if area > AREA_EPSILON {
                    out.push(([i, j, k], area));
                }
            }
        }
    }
    out
}

fn barycentric(p: [f32; 2], a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> Option<[f32; 3]> {
    let total = signed_area(a, b, c);
    if total.abs() <= AREA_EPSILON {
        return None;
    }
    let u = signed_area(p, b, c) / total;
    let v = signed_area(a, p, c) / total;
    let w = 1.0 - u - v;
    if u >= -INSIDE_TOLERANCE && v >= -INSIDE_TOLERANCE && w >= -INSIDE_TOLERANCE {
        Some([u.max(0.0), v.max(0.0), w.max(0.0)])
    } else {
        None
    }
}

fn dist2(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Weights for `p`: one-hot on an exact point, barycentric inside the smallest
/// containing triangle, normalized inverse-square distance otherwise.
pub(crate) fn compute_weights(
    points: &[[f32; 2]],
    triangles: &[([usize; 3], f32)],
    p: [f32; 2],
) -> Vec<f32> {
    let mut weights = vec![0.0; points.len()];

    if let Some(i) = points.iter().position(|q| dist2(*q, p) <= POINT_EPSILON) {
        weights[i] = 1.0;
        return weights;
    }

    let best = triangles
        .iter()
        .filter_map(|(idx, area)| {
            barycentric(p, points[idx[0]], points[idx[1]], points[idx[2]]).map(|b| (idx, *area, b))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((idx, _, bary)) = best {
        let sum: f32 = bary.iter().sum();
        for (slot, b) in idx.iter().zip(bary) {
            weights[*slot] = b / sum;
        }
        return weights;
    }

    let mut sum = 0.0;
    for (w, q) in weights.iter_mut().zip(points) {
        *w = 1.0 / dist2(*q, p);
        sum += *w;
    }
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn square() -> Vec<[f32; 2]> {
        vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0], [0.0, 0.0]]
    }

    #[test]
    fn exact_point_is_one_hot() {
        let pts = square();
        let w = compute_weights(&pts, &triangles(&pts), [1.0, 1.0]);
        assert_eq!(w, vec![0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn inside_uses_smallest_triangle() {
        let pts = square();
        let w = compute_weights(&pts, &triangles(&pts), [0.5, 0.0]);
        // Smallest containing triangles all include the center; weights sum to 1.
        assert!(approx(w.iter().sum::<f32>(), 1.0));
        assert!(w[4] > 0.0);
        assert!(approx(w[0], 0.0) && approx(w[3], 0.0));
    }

    #[test]
    fn outside_uses_inverse_square_distance() {
        let pts = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let w = compute_weights(&pts, &triangles(&pts), [3.0, 0.0]);
        assert!(approx(w.iter().sum::<f32>(), 1.0));
        assert!(w[1] > w[0] && w[0] > w[2]);
    }

    #[test]
    fn collinear_points_have_no_triangles() {
        assert!(triangles(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).is_empty());
    }
}
