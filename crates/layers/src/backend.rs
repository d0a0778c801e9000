use std::collections::BTreeMap;

use catalog::{LayerModel, ResourceKind};
use foundation::ids::RenderLayerId;
use scene::layer::RenderLayer;
use scene::surface::{MapSurface, SurfaceError};
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::registry::LayerRegistry;
use crate::render_status::RenderStatus;

/// WMS version requested when a resource doesn't name one.
pub const DEFAULT_WMS_VERSION: &str = "1.1.1";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerError {
    #[error("no suitable backend for layer `{0}`")]
    NoSuitableBackend(String),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// How a logical layer is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Server-rendered images, one per WMS resource.
    Wms,
    /// A vector layer filled by later feature deliveries.
    Wfs,
    /// Record bounding boxes drawn as features.
    Csw,
    /// Record bounding boxes for plain web resources.
    Www,
    /// A render layer built by the caller; never picked by [`Backend::select`].
    Custom,
}

impl Backend {
    /// Dispatch order: configured record renderers, then WMS, WFS and WWW.
    pub fn select(model: &LayerModel, config: &MapConfig) -> Result<Backend, LayerError> {
        let capabilities = (
            config.is_csw_renderer(&model.id),
            model.contains(ResourceKind::Wms),
            model.contains(ResourceKind::Wfs),
            model.contains(ResourceKind::Www),
        );
        match capabilities {
            (true, _, _, _) => Ok(Backend::Csw),
            (false, true, _, _) => Ok(Backend::Wms),
            (false, false, true, _) => Ok(Backend::Wfs),
            (false, false, false, true) => Ok(Backend::Www),
            (false, false, false, false) => Err(LayerError::NoSuitableBackend(model.id.clone())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Wms => "wms",
            Backend::Wfs => "wfs",
            Backend::Csw => "csw",
            Backend::Www => "www",
            Backend::Custom => "custom",
        }
    }
}

/// Caller-supplied rendering options for [`crate::map::MapView::add_layer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerParams {
    /// Extra source parameters, merged over the defaults.
    pub params: BTreeMap<String, String>,
    pub sld_body: Option<String>,
}

impl LayerParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_sld_body(mut self, sld: impl Into<String>) -> Self {
        self.sld_body = Some(sld.into());
        self
    }
}

/// One image layer per WMS resource. Completion is reported by the renderer
/// once the first image arrives.
pub fn render_wms(
    surface: &mut dyn MapSurface,
    registry: &mut LayerRegistry,
    status: &mut dyn RenderStatus,
    model: &LayerModel,
    params: &LayerParams,
) -> Vec<RenderLayerId> {
    let mut handles = Vec::new();
    for resource in model.resources(ResourceKind::Wms) {
        let version = if resource.version.is_empty() {
            DEFAULT_WMS_VERSION
        } else {
            resource.version.as_str()
        };
        let mut layer = RenderLayer::image(resource.url.clone())
            .with_param("LAYERS", resource.name.clone())
            .with_param("VERSION", version);
        layer.params.extend(params.params.clone());
        layer.sld_body = params.sld_body.clone();

        status.add_resource(&model.id, &resource.url);
        handles.push(registry.add_layer_by_id(surface, layer, &model.id));
    }
    info!(layer = %model.id, count = handles.len(), "wms layers added");
    handles
}

/// A single empty vector layer; features come through
/// [`crate::map::MapView::deliver_features`].
pub fn render_wfs(
    surface: &mut dyn MapSurface,
    registry: &mut LayerRegistry,
    status: &mut dyn RenderStatus,
    model: &LayerModel,
) -> RenderLayerId {
    let handle = registry.add_layer_by_id(surface, RenderLayer::vector(), &model.id);
    for resource in model.resources(ResourceKind::Wfs) {
        status.add_resource(&model.id, &resource.url);
    }
    debug!(layer = %model.id, "wfs vector layer waiting for features");
    handle
}

/// Register a caller-built render layer under the model's id.
pub fn render_custom(
    surface: &mut dyn MapSurface,
    registry: &mut LayerRegistry,
    model: &LayerModel,
    layer: RenderLayer,
) -> RenderLayerId {
    let handle = registry.add_layer_by_id(surface, layer, &model.id);
    debug!(layer = %model.id, "custom render layer attached");
    handle
}

#[cfg(test)]
mod tests {
    use super::{Backend, LayerError, LayerParams, render_custom, render_wfs, render_wms};
    use crate::config::MapConfig;
    use crate::registry::LayerRegistry;
    use crate::render_status::StatusLog;
    use catalog::{CatalogRecord, LayerModel, OnlineResource, ResourceKind};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use scene::layer::{RenderLayer, RenderLayerKind};
    use scene::memory::MemorySurface;
    use scene::surface::MapSurface;
    use scene::view::Viewport;

    fn model(id: &str, kinds: &[ResourceKind]) -> LayerModel {
        let mut record = CatalogRecord::new(format!("{id}-rec"), id);
        for (i, kind) in kinds.iter().enumerate() {
            record = record.with_resource(OnlineResource::new(
                *kind,
                format!("http://example.org/{i}"),
                format!("ns:{id}{i}"),
            ));
        }
        LayerModel::new(id, id).with_record(record)
    }

    #[test]
    fn dispatch_order() {
        let config = MapConfig {
            csw_renderer_ids: vec!["forced".to_string()],
            ..MapConfig::default()
        };
        let cases = [
            (model("a", &[ResourceKind::Wfs, ResourceKind::Wms]), Backend::Wms),
            (model("b", &[ResourceKind::Www, ResourceKind::Wfs]), Backend::Wfs),
            (model("c", &[ResourceKind::Www]), Backend::Www),
            (model("forced", &[ResourceKind::Wms]), Backend::Csw),
        ];
        for (m, expected) in cases {
            assert_eq!(Backend::select(&m, &config), Ok(expected), "{}", m.id);
        }

        let none = model("d", &[ResourceKind::Wcs]);
        assert_eq!(
            Backend::select(&none, &config),
            Err(LayerError::NoSuitableBackend("d".to_string()))
        );
    }

    #[test]
    fn custom_is_never_selected() {
        let config = MapConfig::default();
        let kinds = [ResourceKind::Wms, ResourceKind::Wfs, ResourceKind::Www];
        for kind in kinds {
            let selected = Backend::select(&model("m", &[kind]), &config);
            assert_ne!(selected, Ok(Backend::Custom));
        }
        assert_eq!(Backend::Custom.name(), "custom");
    }

    #[test]
    fn custom_layer_is_registered_as_given() {
        let mut s = MemorySurface::new(Viewport::new(Vec2::new(0.0, 0.0), 1.0, 10.0, 10.0));
        let mut reg = LayerRegistry::new();
        let m = model("own", &[]);
        let tiles = RenderLayer::image("http://example.org/t");
        let handle = render_custom(&mut s, &mut reg, &m, tiles);
        assert_eq!(reg.get_layer_by_id("own"), Some(&[handle][..]));
        assert_eq!(s.layer(handle).unwrap().kind, RenderLayerKind::Image);
    }

    #[test]
    fn wms_layer_per_resource_with_params() {
        let mut s = MemorySurface::new(Viewport::new(Vec2::new(0.0, 0.0), 1.0, 10.0, 10.0));
        let mut reg = LayerRegistry::new();
        let mut status = StatusLog::new();
        let m = model("geo", &[ResourceKind::Wms, ResourceKind::Wms]);
        let params = LayerParams::new()
            .with_param("STYLES", "outline")
            .with_sld_body("<sld/>");

        let handles = render_wms(&mut s, &mut reg, &mut status, &m, &params);
        assert_eq!(handles.len(), 2);
        assert_eq!(reg.get_layer_by_id("geo"), Some(&handles[..]));

        let layer = s.layer(handles[1]).unwrap();
        assert_eq!(layer.kind, RenderLayerKind::Image);
        assert_eq!(layer.url.as_deref(), Some("http://example.org/1"));
        assert_eq!(layer.params.get("LAYERS").map(String::as_str), Some("ns:geo1"));
        assert_eq!(layer.params.get("VERSION").map(String::as_str), Some("1.1.1"));
        assert_eq!(layer.params.get("STYLES").map(String::as_str), Some("outline"));
        assert_eq!(layer.sld_body.as_deref(), Some("<sld/>"));
        assert_eq!(status.pending("geo").len(), 2);
    }

    #[test]
    fn wfs_gets_one_vector_layer() {
        let mut s = MemorySurface::new(Viewport::new(Vec2::new(0.0, 0.0), 1.0, 10.0, 10.0));
        let mut reg = LayerRegistry::new();
        let mut status = StatusLog::new();
        let m = model("feat", &[ResourceKind::Wfs, ResourceKind::Wfs]);
        let handle = render_wfs(&mut s, &mut reg, &mut status, &m);
        assert!(s.layer(handle).unwrap().is_vector());
        assert_eq!(reg.get_layer_by_id("feat"), Some(&[handle][..]));
        assert_eq!(status.pending("feat").len(), 2);
    }
}
