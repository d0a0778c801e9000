use std::collections::BTreeSet;

use catalog::CatalogRecord;
use foundation::bounds::Extent;
use foundation::math::{Srs, transform_extent};

use crate::registry::LayerRegistry;

/// Catalogue records of active layers with a bounding box intersecting
/// `extent` (working SRS). Touching counts; containment is not required.
///
/// Ordering contract: layers in id order, records in layer order, each record
/// id at most once.
pub fn records_in_extent<'a>(
    registry: &'a LayerRegistry,
    extent: &Extent,
) -> Vec<&'a CatalogRecord> {
    let geographic = transform_extent(*extent, Srs::WORKING, Srs::CATALOGUE);

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for id in registry.active_ids() {
        let Some(model) = registry.model(id) else {
            continue;
        };
        for record in &model.csw_records {
            if record.intersects_extent(&geographic) && seen.insert(record.id.as_str()) {
                out.push(record);
            }
        }
    }
    out
}
