//! Polyline simplification.
//!
//! `simplify` is the usual two-pass reduction: a radial-distance pass that drops
//! points closer than the tolerance to their predecessor, followed by
//! Douglas-Peucker on what is left. `simplify_to` drives it with a growing
//! tolerance until a vertex budget is met.

use crate::math::Vec2;

/// Smallest vertex budget `simplify_to` will honour. Both passes always keep
/// the first and last point.
pub const MIN_TARGET_VERTICES: usize = 2;

/// Simplify `points` with the given distance tolerance (same units as the
/// coordinates).
///
/// With `highest_quality` the radial pre-pass is skipped.
pub fn simplify(points: &[Vec2], tolerance: f64, highest_quality: bool) -> Vec<Vec2> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let sq_tolerance = tolerance * tolerance;
    if highest_quality {
        simplify_douglas_peucker(points, sq_tolerance)
    } else {
        let radial = simplify_radial_distance(points, sq_tolerance);
        simplify_douglas_peucker(&radial, sq_tolerance)
    }
}

/// Reduce `points` to at most `target` vertices.
///
/// The step is the distance between the first two vertices; each pass
/// re-simplifies the previous output with the tolerance raised by one step.
/// This is a heuristic: there is no bound on the shape error of the result,
/// only on its vertex count. Inputs already within budget are returned as is.
pub fn simplify_to(points: &[Vec2], target: usize) -> Vec<Vec2> {
    let target = target.max(MIN_TARGET_VERTICES);
    if points.len() <= target {
        return points.to_vec();
    }

    let step = tolerance_step(points, target);
    let mut tolerance = step;
    let mut out = points.to_vec();
    while out.len() > target {
        out = simplify(&out, tolerance, false);
        tolerance += step;
    }
    out
}

/// Strictly positive tolerance increment.
///
/// Coincident leading vertices would give a zero step and the loop in
/// `simplify_to` would never make progress, so fall back to a fraction of the
/// bounding diagonal.
fn tolerance_step(points: &[Vec2], target: usize) -> f64 {
    let first = points[0].distance(points[1]);
    if first.is_finite() && first > 0.0 {
        return first;
    }

    let (mut min, mut max) = (points[0], points[0]);
    for p in points {
        min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
        max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
    }
    let diagonal = min.distance(max) / target as f64;
    if diagonal.is_finite() && diagonal > 0.0 {
        diagonal
    } else {
        1.0
    }
}

fn simplify_radial_distance(points: &[Vec2], sq_tolerance: f64) -> Vec<Vec2> {
    let mut prev = points[0];
    let mut out = vec![prev];
    let mut last = prev;

    for &p in &points[1..] {
        last = p;
        if p.distance_sq(prev) > sq_tolerance {
            out.push(p);
            prev = p;
        }
    }

    if prev != last {
        out.push(last);
    }
    out
}

fn simplify_douglas_peucker(points: &[Vec2], sq_tolerance: f64) -> Vec<Vec2> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    // Explicit stack; freehand outlines can be long enough to make recursion
    // depth a concern.
    let mut stack = vec![(0usize, last)];
    while let Some((first, last)) = stack.pop() {
        let mut max_sq = sq_tolerance;
        let mut index = None;

        for (i, p) in points.iter().enumerate().take(last).skip(first + 1) {
            let sq = segment_distance_sq(*p, points[first], points[last]);
            if sq > max_sq {
                index = Some(i);
                max_sq = sq;
            }
        }

        if let Some(index) = index {
            keep[index] = true;
            if index - first > 1 {
                stack.push((first, index));
            }
            if last - index > 1 {
                stack.push((index, last));
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Squared distance from `p` to the segment `a`-`b`.
pub fn segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let mut x = a.x;
    let mut y = a.y;
    let mut dx = b.x - x;
    let mut dy = b.y - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.x - x) * dx + (p.y - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b.x;
            y = b.y;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    dx = p.x - x;
    dy = p.y - y;
    dx * dx + dy * dy
}
