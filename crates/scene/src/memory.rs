use foundation::bounds::Extent;
use foundation::ids::{FeatureId, IdSequence, RenderLayerId};
use foundation::math::Vec2;
use tracing::trace;

use crate::feature::{Feature, FeatureHit};
use crate::layer::RenderLayer;
use crate::picking::{PickOptions, hit_test};
use crate::surface::{DrawKind, MapSurface, SurfaceError};
use crate::view::{MapState, Viewport};

/// Default pixel tolerance for vector hit tests.
pub const DEFAULT_HIT_TOLERANCE_PX: f64 = 5.0;

#[derive(Debug)]
struct Slot {
    id: RenderLayerId,
    layer: RenderLayer,
    features: Vec<(FeatureId, Feature)>,
}

/// Headless [`MapSurface`]: keeps layers and features in memory and answers
/// pixel queries against a [`Viewport`].
///
/// Ordering contract:
/// - `attached_layers` lists layers in attachment order.
/// - `features_at_pixel` walks layers top to bottom and, within a layer, in
///   insertion order. Hidden layers are skipped.
#[derive(Debug)]
pub struct MemorySurface {
    viewport: Viewport,
    hit_tolerance_px: f64,
    ids: IdSequence,
    slots: Vec<Slot>,
    interaction: Option<DrawKind>,
}

impl MemorySurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            hit_tolerance_px: DEFAULT_HIT_TOLERANCE_PX,
            ids: IdSequence::new(),
            slots: Vec::new(),
            interaction: None,
        }
    }

    pub fn with_hit_tolerance(mut self, pixels: f64) -> Self {
        self.hit_tolerance_px = pixels;
        self
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn features(&self, layer: RenderLayerId) -> Option<&[(FeatureId, Feature)]> {
        self.slot(layer).map(|s| s.features.as_slice())
    }

    fn slot(&self, id: RenderLayerId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    fn slot_mut(&mut self, id: RenderLayerId) -> Result<&mut Slot, SurfaceError> {
        self.slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SurfaceError::UnknownLayer(id))
    }

    fn vector_slot_mut(&mut self, id: RenderLayerId) -> Result<&mut Slot, SurfaceError> {
        let slot = self.slot_mut(id)?;
        if !slot.layer.is_vector() {
            return Err(SurfaceError::NotVector(id));
        }
        Ok(slot)
    }
}

impl MapSurface for MemorySurface {
    fn add_layer(&mut self, layer: RenderLayer) -> RenderLayerId {
        let id = self.ids.next_layer();
        trace!(layer = id.0, kind = ?layer.kind, "attach");
        self.slots.push(Slot {
            id,
            layer,
            features: Vec::new(),
        });
        id
    }

    fn remove_layer(&mut self, id: RenderLayerId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        self.slots.len() != before
    }

    fn layer(&self, id: RenderLayerId) -> Option<&RenderLayer> {
        self.slot(id).map(|s| &s.layer)
    }

    fn attached_layers(&self) -> Vec<RenderLayerId> {
        self.slots.iter().map(|s| s.id).collect()
    }

    fn set_visible(&mut self, id: RenderLayerId, visible: bool) -> Result<(), SurfaceError> {
        self.slot_mut(id)?.layer.visible = visible;
        Ok(())
    }

    fn set_opacity(&mut self, id: RenderLayerId, opacity: f64) -> Result<(), SurfaceError> {
        self.slot_mut(id)?.layer.opacity = opacity;
        Ok(())
    }

    fn update_source_param(
        &mut self,
        id: RenderLayerId,
        key: &str,
        value: &str,
    ) -> Result<(), SurfaceError> {
        self.slot_mut(id)?
            .layer
            .params
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn add_feature(
        &mut self,
        layer: RenderLayerId,
        feature: Feature,
    ) -> Result<FeatureId, SurfaceError> {
        self.vector_slot_mut(layer)?;
        let fid = self.ids.next_feature();
        self.vector_slot_mut(layer)?.features.push((fid, feature));
        Ok(fid)
    }

    fn add_features(
        &mut self,
        layer: RenderLayerId,
        features: Vec<Feature>,
    ) -> Result<Vec<FeatureId>, SurfaceError> {
        self.vector_slot_mut(layer)?;
        let ids: Vec<FeatureId> = features.iter().map(|_| self.ids.next_feature()).collect();
        self.vector_slot_mut(layer)?
            .features
            .extend(ids.iter().copied().zip(features));
        Ok(ids)
    }

    fn features_at_pixel(&self, pixel: Vec2) -> Result<Vec<FeatureHit>, SurfaceError> {
        let coord = self.coordinate_from_pixel(pixel)?;
        let opts = PickOptions::from_pixels(self.hit_tolerance_px, self.viewport.resolution);

        let mut hits = Vec::new();
        for slot in self.slots.iter().rev() {
            if !slot.layer.visible || !slot.layer.is_vector() {
                continue;
            }
            for (fid, feature) in &slot.features {
                if hit_test(&feature.geometry, coord, opts) {
                    hits.push(FeatureHit {
                        id: *fid,
                        layer: slot.id,
                        feature: feature.clone(),
                    });
                }
            }
        }
        Ok(hits)
    }

    fn coordinate_from_pixel(&self, pixel: Vec2) -> Result<Vec2, SurfaceError> {
        if !self.viewport.is_ready() {
            return Err(SurfaceError::ViewNotReady);
        }
        Ok(self.viewport.coordinate_from_pixel(pixel))
    }

    fn view_extent(&self) -> Extent {
        self.viewport.extent()
    }

    fn fit_extent(&mut self, extent: &Extent) {
        self.viewport.fit(extent);
    }

    fn zoom_by(&mut self, levels: i32) {
        self.viewport.zoom_by(levels);
    }

    fn map_state(&self) -> MapState {
        self.viewport.state()
    }

    fn set_map_state(&mut self, state: MapState) {
        self.viewport.restore(state);
    }

    fn start_interaction(&mut self, kind: DrawKind) {
        self.interaction = Some(kind);
    }

    fn stop_interaction(&mut self) {
        self.interaction = None;
    }

    fn active_interaction(&self) -> Option<DrawKind> {
        self.interaction
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySurface;
    use crate::feature::Feature;
    use crate::geometry::Geometry;
    use crate::layer::RenderLayer;
    use crate::surface::{MapSurface, SurfaceError};
    use crate::view::Viewport;
    use foundation::bounds::Extent;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn surface() -> MemorySurface {
        MemorySurface::new(Viewport::new(Vec2::new(0.0, 0.0), 1.0, 100.0, 100.0))
    }

    #[test]
    fn layers_keep_attachment_order() {
        let mut s = surface();
        let a = s.add_layer(RenderLayer::vector());
        let b = s.add_layer(RenderLayer::image("http://example.org/wms"));
        let c = s.add_layer(RenderLayer::vector());
        assert_eq!(s.attached_layers(), vec![a, b, c]);
        assert!(s.remove_layer(b));
        assert!(!s.remove_layer(b));
        assert_eq!(s.attached_layers(), vec![a, c]);
        assert_eq!(s.set_opacity(b, 0.5), Err(SurfaceError::UnknownLayer(b)));
    }

    #[test]
    fn image_layers_reject_features() {
        let mut s = surface();
        let img = s.add_layer(RenderLayer::image("http://example.org/wms"));
        let err = s
            .add_feature(img, Feature::new(Geometry::point(Vec2::new(0.0, 0.0))))
            .unwrap_err();
        assert_eq!(err, SurfaceError::NotVector(img));
    }

    #[test]
    fn feature_batches_are_all_or_nothing() {
        let mut s = surface();
        let vec_layer = s.add_layer(RenderLayer::vector());
        let img = s.add_layer(RenderLayer::image("http://example.org/wms"));
        let batch = vec![
            Feature::new(Geometry::point(Vec2::new(0.0, 0.0))),
            Feature::new(Geometry::point(Vec2::new(1.0, 1.0))),
        ];

        assert_eq!(
            s.add_features(img, batch.clone()),
            Err(SurfaceError::NotVector(img))
        );
        let ids = s.add_features(vec_layer, batch).unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        let stored: Vec<_> = s.features(vec_layer).unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(stored, ids);
    }

    #[test]
    fn pixel_query_is_top_down_and_skips_hidden() {
        let mut s = surface();
        let bottom = s.add_layer(RenderLayer::vector());
        let top = s.add_layer(RenderLayer::vector());
        let area = Geometry::rectangle(&Extent::new(-10.0, -10.0, 10.0, 10.0));
        s.add_feature(bottom, Feature::new(area.clone()).with_owner("below"))
            .unwrap();
        s.add_feature(top, Feature::new(area).with_owner("above"))
            .unwrap();

        let owners: Vec<_> = s
            .features_at_pixel(Vec2::new(50.0, 50.0))
            .unwrap()
            .into_iter()
            .map(|h| h.feature.owner.unwrap())
            .collect();
        assert_eq!(owners, vec!["above".to_string(), "below".to_string()]);

        s.set_visible(top, false).unwrap();
        let hits = s.features_at_pixel(Vec2::new(50.0, 50.0)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].layer, bottom);

        assert!(s.features_at_pixel(Vec2::new(0.0, 0.0)).unwrap().is_empty());
    }

    #[test]
    fn unsized_view_cannot_resolve_pixels() {
        let s = MemorySurface::new(Viewport::new(Vec2::new(0.0, 0.0), 1.0, 0.0, 0.0));
        assert_eq!(
            s.coordinate_from_pixel(Vec2::new(1.0, 1.0)),
            Err(SurfaceError::ViewNotReady)
        );
    }
}
