use catalog::{BoundingBox, LayerModel};
use foundation::ids::RenderLayerId;
use foundation::math::{Srs, Vec2, transform};
use scene::feature::Feature;
use scene::geometry::Geometry;
use scene::layer::RenderLayer;
use scene::surface::MapSurface;
use tracing::debug;

use crate::backend::LayerError;
use crate::registry::LayerRegistry;
use crate::render_status::RenderStatus;

/// Resource key reported while drawing a layer from its records.
pub const RECORD_RESOURCE: &str = "catalogue records";

/// Features for every complete bounding box of every record, in the working
/// SRS. A degenerate box becomes a point; anything else the box outline.
/// Boxes crossing the antimeridian are unrolled eastwards so the outline
/// stays contiguous.
pub fn record_features(model: &LayerModel) -> Vec<Feature> {
    let mut features = Vec::new();
    for record in &model.csw_records {
        for bbox in record.geographic_elements.iter().filter(|b| b.is_complete()) {
            let geometry = bbox_geometry(bbox);
            let mut feature = Feature::new(geometry)
                .with_owner(model.id.clone())
                .with_record(record.id.clone());
            if !record.name.is_empty() {
                feature = feature.with_name(record.name.clone());
            }
            features.push(feature);
        }
    }
    features
}

fn bbox_geometry(bbox: &BoundingBox) -> Geometry {
    let project = |lon: f64, lat: f64| transform(Vec2::new(lon, lat), Srs::CATALOGUE, Srs::WORKING);

    if bbox.is_point() {
        return Geometry::point(project(
            bbox.west_bound_longitude,
            bbox.south_bound_latitude,
        ));
    }

    let west = bbox.west_bound_longitude;
    let mut east = bbox.east_bound_longitude;
    if west > east {
        east += 360.0;
    }
    let (south, north) = (bbox.south_bound_latitude, bbox.north_bound_latitude);
    Geometry::polygon(vec![
        project(west, south),
        project(east, south),
        project(east, north),
        project(west, north),
        project(west, south),
    ])
}

/// Draw `model` from its records onto one vector layer.
pub fn render_records(
    surface: &mut dyn MapSurface,
    registry: &mut LayerRegistry,
    status: &mut dyn RenderStatus,
    model: &LayerModel,
) -> Result<RenderLayerId, LayerError> {
    let handle = match registry.get_layer_by_id(&model.id) {
        Some(handles) => handles[0],
        None => registry.add_layer_by_id(surface, RenderLayer::vector(), &model.id),
    };

    status.add_resource(&model.id, RECORD_RESOURCE);
    let added = surface.add_features(handle, record_features(model))?;
    status.update_complete(&model.id, RECORD_RESOURCE);
    debug!(layer = %model.id, features = added.len(), "record features drawn");
    Ok(handle)
}
