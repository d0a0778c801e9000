use foundation::bounds::Extent;
use foundation::ids::{FeatureId, RenderLayerId};
use foundation::math::Vec2;

use crate::feature::{Feature, FeatureHit};
use crate::layer::RenderLayer;
use crate::view::MapState;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Polygon,
    Box,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("render layer {0:?} is not attached")]
    UnknownLayer(RenderLayerId),
    #[error("render layer {0:?} has no vector source")]
    NotVector(RenderLayerId),
    #[error("map view has no size yet")]
    ViewNotReady,
}

/// The rendering surface the map engine drives.
///
/// Layers are drawn in attachment order, later layers on top. Every method is
/// synchronous; an implementation backed by an asynchronous renderer queues
/// the work and answers queries from its own state.
pub trait MapSurface {
    fn add_layer(&mut self, layer: RenderLayer) -> RenderLayerId;

    /// Detach a layer. Returns `false` if it was not attached.
    fn remove_layer(&mut self, id: RenderLayerId) -> bool;

    fn layer(&self, id: RenderLayerId) -> Option<&RenderLayer>;

    /// Attached layers, bottom to top.
    fn attached_layers(&self) -> Vec<RenderLayerId>;

    fn set_visible(&mut self, id: RenderLayerId, visible: bool) -> Result<(), SurfaceError>;

    fn set_opacity(&mut self, id: RenderLayerId, opacity: f64) -> Result<(), SurfaceError>;

    fn update_source_param(
        &mut self,
        id: RenderLayerId,
        key: &str,
        value: &str,
    ) -> Result<(), SurfaceError>;

    fn add_feature(
        &mut self,
        layer: RenderLayerId,
        feature: Feature,
    ) -> Result<FeatureId, SurfaceError>;

    /// Add a batch of features. On error none of them is added.
    fn add_features(
        &mut self,
        layer: RenderLayerId,
        features: Vec<Feature>,
    ) -> Result<Vec<FeatureId>, SurfaceError>;

    /// Vector features rendered under `pixel`, topmost layer first.
    fn features_at_pixel(&self, pixel: Vec2) -> Result<Vec<FeatureHit>, SurfaceError>;

    fn coordinate_from_pixel(&self, pixel: Vec2) -> Result<Vec2, SurfaceError>;

    fn view_extent(&self) -> Extent;

    fn fit_extent(&mut self, extent: &Extent);

    /// Zoom by whole levels; positive zooms in.
    fn zoom_by(&mut self, levels: i32);

    fn map_state(&self) -> MapState;

    fn set_map_state(&mut self, state: MapState);

    /// Enable an interactive draw tool, replacing any active one.
    fn start_interaction(&mut self, kind: DrawKind);

    fn stop_interaction(&mut self);

    fn active_interaction(&self) -> Option<DrawKind>;
}
