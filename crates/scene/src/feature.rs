use foundation::ids::{FeatureId, RenderLayerId};

use crate::geometry::Geometry;

/// A vector feature as handed to a map surface.
///
/// `owner` is the logical layer id the feature was drawn for, `record_id` the
/// catalogue record it depicts. Clipboard outlines set `clipboard` so click
/// resolution can skip them.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub record_id: Option<String>,
    pub clipboard: bool,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            name: None,
            owner: None,
            record_id: None,
            clipboard: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn clipboard_outline(mut self) -> Self {
        self.clipboard = true;
        self
    }
}

/// A feature found under a pixel, together with where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureHit {
    pub id: FeatureId,
    pub layer: RenderLayerId,
    pub feature: Feature,
}
