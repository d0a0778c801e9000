use foundation::bounds::{Extent, LonLatBox};
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// Geographic extent of a catalogue record, EPSG:4326 degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub west_bound_longitude: f64,
    pub east_bound_longitude: f64,
    pub south_bound_latitude: f64,
    pub north_bound_latitude: f64,
}

impl BoundingBox {
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west_bound_longitude: west,
            east_bound_longitude: east,
            south_bound_latitude: south,
            north_bound_latitude: north,
        }
    }

    pub fn lon_lat_box(&self) -> LonLatBox {
        LonLatBox::new(
            self.west_bound_longitude,
            self.east_bound_longitude,
            self.south_bound_latitude,
            self.north_bound_latitude,
        )
    }

    /// All four bounds are real numbers.
    pub fn is_complete(&self) -> bool {
        [
            self.west_bound_longitude,
            self.east_bound_longitude,
            self.south_bound_latitude,
            self.north_bound_latitude,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Degenerate box describing a single location.
    pub fn is_point(&self) -> bool {
        self.east_bound_longitude == self.west_bound_longitude
            && self.south_bound_latitude == self.north_bound_latitude
    }
}

/// Service protocol of an online resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceKind {
    Wms,
    Wfs,
    Wcs,
    Csw,
    Www,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineResource {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

impl OnlineResource {
    pub fn new(kind: ResourceKind, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            description: String::new(),
            version: String::new(),
            kind,
        }
    }
}

/// Metadata entry describing one discoverable dataset.
///
/// Records are immutable once attached to a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub geographic_elements: Vec<BoundingBox>,
    #[serde(default)]
    pub online_resources: Vec<OnlineResource>,
}

impl CatalogRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            geographic_elements: Vec::new(),
            online_resources: Vec::new(),
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.geographic_elements.push(bbox);
        self
    }

    pub fn with_resource(mut self, resource: OnlineResource) -> Self {
        self.online_resources.push(resource);
        self
    }

    pub fn resources(&self, kind: ResourceKind) -> impl Iterator<Item = &OnlineResource> {
        self.online_resources.iter().filter(move |r| r.kind == kind)
    }

    /// Any bounding box contains the `(lon, lat)` point.
    pub fn contains_point(&self, lon_lat: Vec2) -> bool {
        self.geographic_elements
            .iter()
            .any(|b| b.lon_lat_box().contains(lon_lat))
    }

    /// Any bounding box intersects the geographic extent.
    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        self.geographic_elements
            .iter()
            .any(|b| b.lon_lat_box().intersects_extent(extent))
    }
}
