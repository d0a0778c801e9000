use foundation::bounds::Extent;
use foundation::math::Vec2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Area,
}

/// Vector geometry in the working SRS.
///
/// Area rings are stored open or closed; hit testing treats both the same.
/// The first ring is the exterior, the rest are holes.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point { position: Vec2 },
    Line { vertices: Vec<Vec2> },
    Area { rings: Vec<Vec<Vec2>> },
}

impl Geometry {
    pub fn point(position: Vec2) -> Self {
        Self::Point { position }
    }

    pub fn polygon(exterior: Vec<Vec2>) -> Self {
        Self::Area {
            rings: vec![exterior],
        }
    }

    /// Rectangle outline of `extent`.
    pub fn rectangle(extent: &Extent) -> Self {
        Self::polygon(extent.ring().to_vec())
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point { .. } => GeometryKind::Point,
            Self::Line { .. } => GeometryKind::Line,
            Self::Area { .. } => GeometryKind::Area,
        }
    }

    pub fn extent(&self) -> Option<Extent> {
        match self {
            Self::Point { position } => Extent::from_points([*position]),
            Self::Line { vertices } => Extent::from_points(vertices.iter().copied()),
            Self::Area { rings } => Extent::from_points(rings.iter().flatten().copied()),
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Point { .. } => 1,
            Self::Line { vertices } => vertices.len(),
            Self::Area { rings } => rings.iter().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, GeometryKind};
    use foundation::bounds::Extent;
    use foundation::math::Vec2;

    #[test]
    fn rectangle_covers_extent() {
        let e = Extent::new(-1.0, -2.0, 3.0, 4.0);
        let g = Geometry::rectangle(&e);
        assert_eq!(g.kind(), GeometryKind::Area);
        assert_eq!(g.extent(), Some(e));
        assert_eq!(g.vertex_count(), 5);
    }

    #[test]
    fn empty_line_has_no_extent() {
        let g = Geometry::Line { vertices: vec![] };
        assert_eq!(g.extent(), None);
        assert_eq!(Geometry::point(Vec2::new(1.0, 1.0)).vertex_count(), 1);
    }
}
