use crate::point3d::Point3d;
use rand::Rng;

/// Farthest point sampling with a random first pick.
///
/// Requires `!points.is_empty()` and `k <= points.len()`; the pipeline's
/// acceptance gate guarantees both.
pub fn farthest_point_sample<R: Rng>(points: &[Point3d], k: usize, rng: &mut R) -> Vec<usize> {
    let first = rng.gen_range(0..points.len());
    farthest_point_sample_from(points, k, first)
}

/// Greedy farthest point sampling starting at `first`.
///
/// Returns `k` indices in selection order. Each step picks the point with the
/// largest squared distance to the points chosen so far, lowest index on ties.
/// Already chosen points are never picked again, so duplicate coordinates
/// still yield distinct indices.
pub fn farthest_point_sample_from(points: &[Point3d], k: usize, first: usize) -> Vec<usize> {
    debug_assert!(first < points.len());
    debug_assert!(k <= points.len());
    let mut selected = Vec::with_capacity(k);
    if k == 0 {
        return selected;
    }
    selected.push(first);

    let anchor = points[first];
    let mut min_dist: Vec<f32> = points.iter().map(|p| p.distance_squared(&anchor)).collect();
    min_dist[first] = f32::NEG_INFINITY;

    for _ in 1..k {
        let mut best = 0;
        let mut best_dist = f32::NEG_INFINITY;
        for (i, d) in min_dist.iter().enumerate() {
            if *d > best_dist {
                best = i;
                best_dist = *d;
            }
        }
        selected.push(best);

        let anchor = points[best];
        min_dist[best] = f32::NEG_INFINITY;
        for (d, p) in min_dist.iter_mut().zip(points) {
            let candidate = p.distance_squared(&anchor);
            if candidate < *d {
                *d = candidate;
            }
        }
    }
    selected
}
