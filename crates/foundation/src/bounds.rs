use crate::math::Vec2;

/// Axis-aligned extent `[min_x, min_y, max_x, max_y]` in a single SRS.
///
/// All tests are inclusive: touching edges count as contact.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest extent covering all `points`, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut out = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            out.min_x = out.min_x.min(p.x);
            out.min_y = out.min_y.min(p.y);
            out.max_x = out.max_x.max(p.x);
            out.max_y = out.max_y.max(p.y);
        }
        Some(out)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Closed ring of the four corners, counter-clockwise from `(min_x, min_y)`.
    pub fn ring(&self) -> [Vec2; 5] {
        [
            Vec2::new(self.min_x, self.min_y),
            Vec2::new(self.max_x, self.min_y),
            Vec2::new(self.max_x, self.max_y),
            Vec2::new(self.min_x, self.max_y),
            Vec2::new(self.min_x, self.min_y),
        ]
    }
}

/// Geographic box in degrees, as published by catalogue records.
///
/// Antimeridian policy: `west > east` means the box wraps across 180°, covering
/// `[west, 180] ∪ [-180, east]`. Every test splits such a box into its two
/// halves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LonLatBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl LonLatBox {
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// The one or two non-wrapping extents that make up this box.
    pub fn parts(&self) -> impl Iterator<Item = Extent> + use<> {
        let (south, north) = (self.south.min(self.north), self.south.max(self.north));
        let (first, second) = if self.crosses_antimeridian() {
            (
                Extent::new(self.west, south, 180.0, north),
                Some(Extent::new(-180.0, south, self.east, north)),
            )
        } else {
            (Extent::new(self.west, south, self.east, north), None)
        };
        core::iter::once(first).chain(second)
    }

    /// Point-in-box for a `(lon, lat)` point. Longitudes outside `[-180, 180]`
    /// (a view scrolled past the dateline) are wrapped first.
    pub fn contains(&self, p: Vec2) -> bool {
        let p = Vec2::new(wrap_longitude(p.x), p.y);
        self.parts().any(|part| part.contains(p))
    }

    /// Intersection with a geographic extent. Extents wider than the world are
    /// treated as covering every longitude.
    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        self.intersects(&LonLatBox::from_extent(extent))
    }

    pub fn intersects(&self, other: &LonLatBox) -> bool {
        self.parts()
            .any(|a| other.parts().any(|b| a.intersects(&b)))
    }

    /// Geographic extent to box, wrapping longitudes that spill past ±180.
    pub fn from_extent(extent: &Extent) -> Self {
        if extent.width() >= 360.0 {
            return Self::new(-180.0, 180.0, extent.min_y, extent.max_y);
        }
        Self::new(
            wrap_longitude(extent.min_x),
            wrap_longitude(extent.max_x),
            extent.min_y,
            extent.max_y,
        )
    }
}

/// Wraps a longitude into `[-180, 180]`; values already in range are returned
/// untouched so `180.0` stays `180.0`.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) || !lon.is_finite() {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}
