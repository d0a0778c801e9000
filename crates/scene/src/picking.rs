use foundation::math::Vec2;
use foundation::math::simplify::segment_distance_sq;

use crate::geometry::Geometry;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    /// Hit tolerance in map units.
    pub tolerance: f64,
}

impl PickOptions {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Pixel tolerance scaled by the view resolution.
    pub fn from_pixels(pixels: f64, resolution: f64) -> Self {
        Self::new(pixels * resolution)
    }
}

/// Whether `coord` touches `geometry`.
///
/// Points and lines are hit within the tolerance. Areas are hit anywhere
/// inside the exterior ring and outside every hole, or within the tolerance of
/// any ring edge.
pub fn hit_test(geometry: &Geometry, coord: Vec2, opts: PickOptions) -> bool {
    let sq_tolerance = opts.tolerance * opts.tolerance;
    match geometry {
        Geometry::Point { position } => position.distance_sq(coord) <= sq_tolerance,
        Geometry::Line { vertices } => near_polyline(vertices, coord, sq_tolerance),
        Geometry::Area { rings } => {
            let Some((exterior, holes)) = rings.split_first() else {
                return false;
            };
            let inside = point_in_ring(coord, exterior)
                && !holes.iter().any(|hole| point_in_ring(coord, hole));
            inside
                || rings
                    .iter()
                    .any(|ring| near_ring(ring, coord, sq_tolerance))
        }
    }
}

/// Even-odd test; an implicit closing edge is assumed if the ring is open.
pub fn point_in_ring(p: Vec2, ring: &[Vec2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn near_polyline(vertices: &[Vec2], p: Vec2, sq_tolerance: f64) -> bool {
    match vertices {
        [] => false,
        [only] => only.distance_sq(p) <= sq_tolerance,
        _ => vertices
            .windows(2)
            .any(|w| segment_distance_sq(p, w[0], w[1]) <= sq_tolerance),
    }
}

fn near_ring(ring: &[Vec2], p: Vec2, sq_tolerance: f64) -> bool {
    if near_polyline(ring, p, sq_tolerance) {
        return true;
    }
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 2 => {
            segment_distance_sq(p, *last, *first) <= sq_tolerance
        }
        _ => false,
    }
}
