use catalog::{LayerModel, ResourceKind};
use foundation::ids::RenderLayerId;
use foundation::math::{Srs, Vec2, transform};
use scene::feature::FeatureHit;
use scene::surface::{MapSurface, SurfaceError};
use tracing::debug;

use crate::registry::LayerRegistry;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("pixel ({x}, {y}) maps to a non-finite coordinate")]
    NonFiniteCoordinate { x: f64, y: f64 },
}

/// Everything under one map click.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickResult {
    /// Vector features under the pixel, clipboard outlines excluded.
    pub clicked_features: Vec<FeatureHit>,
    /// Render layers whose records' bounding boxes contain the click point.
    pub clicked_layers: Vec<RenderLayerId>,
    pub pixel: Vec2,
    /// Click location in the working SRS.
    pub click_coord: Vec2,
}

/// Layers whose bounding boxes are meaningful for point queries. Only
/// server-rendered map layers qualify; vector layers answer through their
/// features.
pub fn is_bbox_queryable(model: &LayerModel) -> bool {
    model.contains(ResourceKind::Wms)
}

/// Resolve a click against the current registry and surface.
///
/// Ordering contract:
/// - `clicked_layers` follows the surface's attachment order, each render
///   layer at most once.
/// - `clicked_features` keeps the surface's top-to-bottom order.
pub fn resolve_click(
    registry: &LayerRegistry,
    surface: &dyn MapSurface,
    pixel: Vec2,
) -> Result<ClickResult, ResolutionError> {
    let click_coord = surface.coordinate_from_pixel(pixel)?;
    if !click_coord.x.is_finite() || !click_coord.y.is_finite() {
        return Err(ResolutionError::NonFiniteCoordinate {
            x: pixel.x,
            y: pixel.y,
        });
    }
    let lon_lat = transform(click_coord, Srs::WORKING, Srs::CATALOGUE);

    let mut clicked_layers = Vec::new();
    for handle in surface.attached_layers() {
        let Some(model) = registry.owner_of(handle).and_then(|id| registry.model(id)) else {
            continue;
        };
        if !is_bbox_queryable(model) || clicked_layers.contains(&handle) {
            continue;
        }
        if model.csw_records.iter().any(|r| r.contains_point(lon_lat)) {
            clicked_layers.push(handle);
        }
    }

    let clicked_features: Vec<FeatureHit> = surface
        .features_at_pixel(pixel)?
        .into_iter()
        .filter(|hit| !hit.feature.clipboard)
        .collect();

    debug!(
        lon = lon_lat.x,
        lat = lon_lat.y,
        layers = clicked_layers.len(),
        features = clicked_features.len(),
        "click resolved"
    );
    Ok(ClickResult {
        clicked_features,
        clicked_layers,
        pixel,
        click_coord,
    })
}

#[cfg(test)]
mod tests {
    use super::{ResolutionError, resolve_click};
    use crate::registry::LayerRegistry;
    use catalog::{BoundingBox, CatalogRecord, LayerModel, OnlineResource, ResourceKind};
    use foundation::bounds::Extent;
    use foundation::math::{Vec2, lon_lat_to_mercator};
    use pretty_assertions::assert_eq;
    use scene::feature::Feature;
    use scene::geometry::Geometry;
    use scene::layer::RenderLayer;
    use scene::memory::MemorySurface;
    use scene::surface::{MapSurface, SurfaceError};
    use scene::view::Viewport;

    fn wms_model(id: &str, bbox: BoundingBox) -> LayerModel {
        LayerModel::new(id, id).with_record(
            CatalogRecord::new(format!("{id}-r"), id)
                .with_bbox(bbox)
                .with_resource(OnlineResource::new(
                    ResourceKind::Wms,
                    "http://example.org/wms",
                    id,
                )),
        )
    }

    fn view_at(lon: f64, lat: f64) -> MemorySurface {
        let center = lon_lat_to_mercator(Vec2::new(lon, lat));
        MemorySurface::new(Viewport::new(center, 100.0, 300.0, 400.0))
    }

    fn register(reg: &mut LayerRegistry, s: &mut MemorySurface, model: LayerModel, n: usize) {
        for _ in 0..n {
            reg.add_layer_by_id(s, RenderLayer::image("http://example.org/wms"), &model.id);
        }
        reg.insert_model(model);
    }

    #[test]
    fn matches_layers_whose_boxes_contain_the_click() {
        let mut s = view_at(15.0, 0.0);
        let mut reg = LayerRegistry::new();
        let inside = wms_model("inside", BoundingBox::new(10.0, 20.0, -10.0, 10.0));
        let outside = wms_model("outside", BoundingBox::new(30.0, 40.0, -10.0, 10.0));
        register(&mut reg, &mut s, inside, 2);
        register(&mut reg, &mut s, outside, 1);

        let result = resolve_click(&reg, &s, Vec2::new(150.0, 200.0)).unwrap();
        let expected = reg.get_layer_by_id("inside").unwrap().to_vec();
        assert_eq!(result.clicked_layers, expected);
        assert!(result.clicked_features.is_empty());
    }

    #[test]
    fn overlapping_boxes_add_layer_once() {
        let mut s = view_at(15.0, 0.0);
        let mut reg = LayerRegistry::new();
        let wide = BoundingBox::new(0.0, 30.0, -5.0, 5.0);
        let second = CatalogRecord::new("second", "second").with_bbox(wide);
        let model = wms_model("dup", BoundingBox::new(10.0, 20.0, -10.0, 10.0)).with_record(second);
        register(&mut reg, &mut s, model, 1);

        let result = resolve_click(&reg, &s, Vec2::new(150.0, 200.0)).unwrap();
        assert_eq!(result.clicked_layers.len(), 1);
    }

    #[test]
    fn layers_without_wms_are_not_box_tested() {
        let mut s = view_at(15.0, 0.0);
        let mut reg = LayerRegistry::new();
        let vector_only = LayerModel::new("v", "v").with_record(
            CatalogRecord::new("r", "r").with_bbox(BoundingBox::new(10.0, 20.0, -10.0, 10.0)),
        );
        let handle = reg.add_layer_by_id(&mut s, RenderLayer::vector(), "v");
        reg.insert_model(vector_only);
        let whole_view = Geometry::rectangle(&s.view_extent());
        s.add_feature(handle, Feature::new(whole_view).with_owner("v")).unwrap();

        let result = resolve_click(&reg, &s, Vec2::new(150.0, 200.0)).unwrap();
        assert!(result.clicked_layers.is_empty());
        assert_eq!(result.clicked_features.len(), 1);
        assert_eq!(result.clicked_features[0].layer, handle);
    }

    #[test]
    fn clipboard_outlines_are_excluded() {
        let mut s = view_at(0.0, 0.0);
        let reg = LayerRegistry::new();
        let handle = s.add_layer(RenderLayer::vector());
        let area = Geometry::rectangle(&Extent::new(-1e6, -1e6, 1e6, 1e6));
        s.add_feature(handle, Feature::new(area.clone()).clipboard_outline())
            .unwrap();
        s.add_feature(handle, Feature::new(area)).unwrap();

        let result = resolve_click(&reg, &s, Vec2::new(150.0, 200.0)).unwrap();
        assert_eq!(result.clicked_features.len(), 1);
        assert!(!result.clicked_features[0].feature.clipboard);
        assert_eq!(result.pixel, Vec2::new(150.0, 200.0));
    }

    #[test]
    fn dateline_box_catches_clicks_on_both_sides() {
        let mut reg = LayerRegistry::new();
        let mut s = view_at(175.0, 0.0);
        let pacific = wms_model("pacific", BoundingBox::new(170.0, -170.0, -10.0, 10.0));
        register(&mut reg, &mut s, pacific, 1);
        let centre = Vec2::new(150.0, 200.0);
        assert_eq!(resolve_click(&reg, &s, centre).unwrap().clicked_layers.len(), 1);

        s.set_viewport(*view_at(-175.0, 0.0).viewport());
        assert_eq!(resolve_click(&reg, &s, centre).unwrap().clicked_layers.len(), 1);

        s.set_viewport(*view_at(0.0, 0.0).viewport());
        assert!(resolve_click(&reg, &s, centre).unwrap().clicked_layers.is_empty());
    }

    #[test]
    fn surface_failures_propagate() {
        let s = MemorySurface::new(Viewport::new(Vec2::new(0.0, 0.0), 1.0, 0.0, 0.0));
        let reg = LayerRegistry::new();
        assert_eq!(
            resolve_click(&reg, &s, Vec2::new(1.0, 1.0)),
            Err(ResolutionError::Surface(SurfaceError::ViewNotReady))
        );
    }
}
