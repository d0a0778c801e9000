//! Spatial reference systems and the transforms between them.
//!
//! Only the two systems the map works in are modelled: geographic lon/lat
//! (EPSG:4326 and its aliases) and spherical Web Mercator (EPSG:3857). Codes
//! arrive as free-form strings from catalogue records and user input, so
//! parsing is lenient about case, whitespace and the common URN/URL spellings.

use core::fmt;
use core::str::FromStr;

use crate::bounds::Extent;
use crate::math::Vec2;

/// Sphere radius used by Web Mercator (WGS84 semi-major axis, meters).
pub const WGS84_A: f64 = 6_378_137.0;

/// Latitude at which Web Mercator becomes square (degrees).
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the width of the Web Mercator world (meters).
pub const MERCATOR_HALF_WORLD: f64 = core::f64::consts::PI * WGS84_A;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("unsupported spatial reference system: {0}")]
    UnsupportedSrs(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Srs {
    /// Longitude/latitude in degrees, x = longitude.
    Geographic,
    /// Spherical Web Mercator in meters.
    WebMercator,
}

impl Srs {
    /// The projection the map view and the clipboard work in.
    pub const WORKING: Srs = Srs::WebMercator;

    /// The projection catalogue bounding boxes are expressed in.
    pub const CATALOGUE: Srs = Srs::Geographic;

    pub fn parse(code: &str) -> Result<Self, ProjectionError> {
        let normalized = code.trim().to_ascii_uppercase();
        let epsg = normalized
            .strip_prefix("URN:OGC:DEF:CRS:EPSG::")
            .or_else(|| normalized.strip_prefix("URN:OGC:DEF:CRS:EPSG:6.6:"))
            .or_else(|| normalized.strip_prefix("HTTP://WWW.OPENGIS.NET/GML/SRS/EPSG.XML#"))
            .or_else(|| normalized.strip_prefix("HTTP://WWW.OPENGIS.NET/DEF/CRS/EPSG/0/"))
            .or_else(|| normalized.strip_prefix("EPSG::"))
            .or_else(|| normalized.strip_prefix("EPSG:"));

        match epsg {
            Some("4326" | "4283" | "4269" | "4258") => Ok(Srs::Geographic),
            Some("3857" | "900913" | "102100" | "102113" | "3785") => Ok(Srs::WebMercator),
            Some(_) => Err(ProjectionError::UnsupportedSrs(code.to_string())),
            None => match normalized.as_str() {
                "CRS:84" | "OGC:CRS84" | "URN:OGC:DEF:CRS:OGC:1.3:CRS84" => Ok(Srs::Geographic),
                _ => Err(ProjectionError::UnsupportedSrs(code.to_string())),
            },
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Srs::Geographic => "EPSG:4326",
            Srs::WebMercator => "EPSG:3857",
        }
    }
}

impl fmt::Display for Srs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Srs {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Srs::parse(s)
    }
}

/// Geographic `(lon, lat)` degrees to Web Mercator meters.
///
/// Latitudes beyond the Mercator limit are clamped, so poles map to the top and
/// bottom edges of the world square instead of infinity.
pub fn lon_lat_to_mercator(p: Vec2) -> Vec2 {
    let lat = p.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    let x = WGS84_A * p.x.to_radians();
    let y = WGS84_A * (core::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Vec2::new(x, y)
}

/// Web Mercator meters to geographic `(lon, lat)` degrees.
pub fn mercator_to_lon_lat(p: Vec2) -> Vec2 {
    let lon = (p.x / WGS84_A).to_degrees();
    let lat = (2.0 * (p.y / WGS84_A).exp().atan() - core::f64::consts::FRAC_PI_2).to_degrees();
    Vec2::new(lon, lat)
}

pub fn transform(p: Vec2, from: Srs, to: Srs) -> Vec2 {
    match (from, to) {
        (Srs::Geographic, Srs::WebMercator) => lon_lat_to_mercator(p),
        (Srs::WebMercator, Srs::Geographic) => mercator_to_lon_lat(p),
        (Srs::Geographic, Srs::Geographic) | (Srs::WebMercator, Srs::WebMercator) => p,
    }
}

/// Transform between two SRS given by their codes.
pub fn transform_codes(p: Vec2, from: &str, to: &str) -> Result<Vec2, ProjectionError> {
    Ok(transform(p, Srs::parse(from)?, Srs::parse(to)?))
}

/// Transform an extent by its corners.
///
/// Both supported projections are axis-separable and monotonic, so the
/// transformed corners bound the transformed area exactly.
pub fn transform_extent(extent: Extent, from: Srs, to: Srs) -> Extent {
    let min = transform(Vec2::new(extent.min_x, extent.min_y), from, to);
    let max = transform(Vec2::new(extent.max_x, extent.max_y), from, to);
    Extent::new(min.x, min.y, max.x, max.y)
}

#[cfg(test)]
mod tests {
    use super::{
        MERCATOR_HALF_WORLD, ProjectionError, Srs, lon_lat_to_mercator, mercator_to_lon_lat,
        transform_codes, transform_extent,
    };
    use crate::bounds::Extent;
    use crate::math::Vec2;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parses_common_spellings() {
        assert_eq!(Srs::parse("EPSG:4326"), Ok(Srs::Geographic));
        assert_eq!(Srs::parse(" epsg:3857 "), Ok(Srs::WebMercator));
        assert_eq!(Srs::parse("CRS:84"), Ok(Srs::Geographic));
        assert_eq!(Srs::parse("EPSG:900913"), Ok(Srs::WebMercator));
        assert_eq!(Srs::parse("urn:ogc:def:crs:EPSG::4283"), Ok(Srs::Geographic));
        assert_eq!(
            Srs::parse("http://www.opengis.net/gml/srs/epsg.xml#4326"),
            Ok(Srs::Geographic)
        );
        assert_eq!(
            Srs::parse("EPSG:28355"),
            Err(ProjectionError::UnsupportedSrs("EPSG:28355".to_string()))
        );
        assert_eq!(Srs::WORKING.to_string(), "EPSG:3857");
    }

    #[test]
    fn mercator_known_points() {
        let origin = lon_lat_to_mercator(Vec2::new(0.0, 0.0));
        assert_abs_diff_eq!(origin.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(origin.y, 0.0, epsilon = 1e-9);

        let edge = lon_lat_to_mercator(Vec2::new(180.0, 0.0));
        assert_abs_diff_eq!(edge.x, MERCATOR_HALF_WORLD, epsilon = 1e-6);

        let top = lon_lat_to_mercator(Vec2::new(0.0, 90.0));
        assert_abs_diff_eq!(top.y, MERCATOR_HALF_WORLD, epsilon = 1e-3);
    }

    #[test]
    fn mercator_round_trip() {
        let p = Vec2::new(134.5, -27.25);
        let back = mercator_to_lon_lat(lon_lat_to_mercator(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn transform_by_code_is_identity_for_same_srs() {
        let p = Vec2::new(12.0, 34.0);
        assert_eq!(transform_codes(p, "EPSG:4326", "CRS:84"), Ok(p));
        assert!(transform_codes(p, "EPSG:4326", "EPSG:27700").is_err());
    }

    #[test]
    fn extent_transform_keeps_orientation() {
        let e = Extent::new(10.0, -10.0, 20.0, 10.0);
        let m = transform_extent(e, Srs::Geographic, Srs::WebMercator);
        assert!(m.min_x < m.max_x);
        assert!(m.min_y < m.max_y);
        let back = transform_extent(m, Srs::WebMercator, Srs::Geographic);
        assert_abs_diff_eq!(back.min_x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back.max_y, 10.0, epsilon = 1e-9);
    }
}
