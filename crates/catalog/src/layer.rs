use serde::{Deserialize, Serialize};

use crate::record::{CatalogRecord, OnlineResource, ResourceKind};

/// Layer mode given to layers built straight from a single record.
pub const RECORD_LAYER_MODE: &str = "NA";

/// A logical data layer as the user sees it: one id, backed by one or more
/// catalogue records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub layer_mode: String,
    #[serde(default)]
    pub csw_records: Vec<CatalogRecord>,
}

impl LayerModel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            hidden: false,
            layer_mode: String::new(),
            csw_records: Vec::new(),
        }
    }

    /// Wraps a single record as a visible layer sharing the record's id.
    pub fn from_record(record: CatalogRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            hidden: false,
            layer_mode: RECORD_LAYER_MODE.to_string(),
            csw_records: vec![record],
        }
    }

    pub fn with_record(mut self, record: CatalogRecord) -> Self {
        self.csw_records.push(record);
        self
    }

    /// Online resources of `kind` across all records, in record order.
    pub fn resources(&self, kind: ResourceKind) -> impl Iterator<Item = &OnlineResource> {
        self.csw_records.iter().flat_map(move |r| r.resources(kind))
    }

    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.resources(kind).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::LayerModel;
    use crate::record::{BoundingBox, CatalogRecord, OnlineResource, ResourceKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn from_record_copies_identity() {
        let mut rec = CatalogRecord::new("rec-9", "Boreholes")
            .with_bbox(BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        rec.description = "drill holes".to_string();
        let layer = LayerModel::from_record(rec.clone());
        assert_eq!(layer.id, "rec-9");
        assert_eq!(layer.name, "Boreholes");
        assert_eq!(layer.description, "drill holes");
        assert_eq!(layer.layer_mode, "NA");
        assert!(!layer.hidden);
        assert_eq!(layer.csw_records, vec![rec]);
    }

    #[test]
    fn resources_span_records() {
        let layer = LayerModel::new("l", "l")
            .with_record(
                CatalogRecord::new("a", "a")
                    .with_resource(OnlineResource::new(ResourceKind::Wms, "u1", "n1")),
            )
            .with_record(
                CatalogRecord::new("b", "b")
                    .with_resource(OnlineResource::new(ResourceKind::Wfs, "u2", "n2"))
                    .with_resource(OnlineResource::new(ResourceKind::Wms, "u3", "n3")),
            );
        let names: Vec<&str> = layer
            .resources(ResourceKind::Wms)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["n1", "n3"]);
        assert!(layer.contains(ResourceKind::Wfs));
        assert!(!layer.contains(ResourceKind::Csw));
    }
}
