//! `MapView`: the single owner of the surface, the layer registry and the
//! clipboard, and the entry point for user interaction.

use catalog::{CatalogRecord, LayerModel};
use foundation::bounds::Extent;
use foundation::ids::RenderLayerId;
use foundation::math::{Srs, Vec2};
use foundation::time::Time;
use runtime::event_bus::Topic;
use runtime::gate::{ClickDispatcher, ClickGate, HandlerId};
use scene::feature::Feature;
use scene::geometry::Geometry;
use scene::layer::RenderLayer;
use scene::selection::{Clipboard, ClipboardError, SelectionPolygon, format_coordinates};
use scene::surface::{DrawKind, MapSurface, SurfaceError};
use scene::view::MapState;
use tracing::{debug, info};

use crate::backend::{Backend, LayerError, LayerParams, render_custom, render_wfs, render_wms};
use crate::click::{ClickResult, ResolutionError, resolve_click};
use crate::config::{ConfigError, MapConfig};
use crate::query::records_in_extent;
use crate::records::render_records;
use crate::registry::LayerRegistry;
use crate::render_status::RenderStatus;

#[derive(Debug)]
enum DrawSession {
    Polygon {
        sketch: RenderLayerId,
        done: Topic<SelectionPolygon>,
    },
    Box {
        done: Topic<Extent>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimedDisplay {
    layer: RenderLayerId,
    until: Time,
}

pub struct MapView<S, R> {
    config: MapConfig,
    surface: S,
    status: R,
    registry: LayerRegistry,
    dispatcher: ClickDispatcher,
    clicked: Topic<ClickResult>,
    clipboard: Clipboard,
    draw: Option<DrawSession>,
    timed: Vec<TimedDisplay>,
}

impl<S, R> std::fmt::Debug for MapView<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapView")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher)
            .field("clipboard", &self.clipboard)
            .finish_non_exhaustive()
    }
}

impl<S: MapSurface, R: RenderStatus> MapView<S, R> {
    pub fn new(surface: S, status: R, config: MapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            dispatcher: ClickDispatcher::new(ClickGate::new(config.click_settle_ms)),
            clipboard: Clipboard::new(config.clipboard_target_vertices),
            config,
            surface,
            status,
            registry: LayerRegistry::new(),
            clicked: Topic::new(),
            draw: None,
            timed: Vec::new(),
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn status(&self) -> &R {
        &self.status
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Replay-latest stream of resolved clicks.
    pub fn clicked_stream(&self) -> Topic<ClickResult> {
        self.clicked.clone()
    }

    pub fn register_click_handler(&mut self, handler: impl FnMut(Vec2) + 'static) -> HandlerId {
        self.dispatcher.register(handler)
    }

    pub fn unregister_click_handler(&mut self, id: HandlerId) -> bool {
        self.dispatcher.unregister(id)
    }

    /// A click at `pixel`. Returns `Ok(None)` while drawing suppresses clicks.
    /// The result is published before the registered handlers run.
    pub fn handle_click(
        &mut self,
        pixel: Vec2,
        now: Time,
    ) -> Result<Option<ClickResult>, ResolutionError> {
        if !self.dispatcher.accepts(now) {
            return Ok(None);
        }
        let result = resolve_click(&self.registry, &self.surface, pixel)?;
        self.clicked.publish(result.clone());
        self.dispatcher.notify(pixel);
        Ok(Some(result))
    }

    /// Render `model` with the backend chosen for it. Any layer already
    /// registered under the same id is removed first.
    pub fn add_layer(
        &mut self,
        model: LayerModel,
        params: &LayerParams,
    ) -> Result<Backend, LayerError> {
        self.remove_layer(&model.id);
        let backend = Backend::select(&model, &self.config)?;
        self.render_with(model, backend, params, None)?;
        Ok(backend)
    }

    /// Wrap one record as a layer and draw it from its bounding boxes.
    pub fn add_csw_record(&mut self, record: CatalogRecord) -> Result<Backend, LayerError> {
        let model = LayerModel::from_record(record);
        self.remove_layer(&model.id);
        self.render_with(model, Backend::Csw, &LayerParams::default(), None)?;
        Ok(Backend::Csw)
    }

    /// Register a caller-built render layer so clicks and extent queries
    /// still see it. Appends to any render layers already held under the id.
    pub fn append_custom_layer(
        &mut self,
        model: LayerModel,
        layer: RenderLayer,
    ) -> Result<RenderLayerId, LayerError> {
        let id = model.id.clone();
        let params = LayerParams::default();
        let handles = self.render_with(model, Backend::Custom, &params, Some(layer))?;
        handles
            .last()
            .copied()
            .ok_or(LayerError::NoSuitableBackend(id))
    }

    /// `custom` carries the render layer for [`Backend::Custom`] and is
    /// ignored by every other backend.
    fn render_with(
        &mut self,
        model: LayerModel,
        backend: Backend,
        params: &LayerParams,
        custom: Option<RenderLayer>,
    ) -> Result<Vec<RenderLayerId>, LayerError> {
        let surface = &mut self.surface;
        let registry = &mut self.registry;
        let status = &mut self.status;
        let rendered = match (backend, custom) {
            (Backend::Wms, _) => Ok(render_wms(surface, registry, status, &model, params)),
            (Backend::Wfs, _) => Ok(vec![render_wfs(surface, registry, status, &model)]),
            (Backend::Csw | Backend::Www, _) => {
                render_records(surface, registry, status, &model).map(|h| vec![h])
            }
            (Backend::Custom, Some(layer)) => {
                Ok(vec![render_custom(surface, registry, &model, layer)])
            }
            (Backend::Custom, None) => Err(LayerError::NoSuitableBackend(model.id.clone())),
        };

        match rendered {
            Ok(handles) => {
                info!(layer = %model.id, backend = backend.name(), "layer added");
                self.registry.insert_model(model);
                Ok(handles)
            }
            Err(e) => {
                self.registry
                    .remove_layer_by_id(&mut self.surface, &mut self.status, &model.id);
                Err(e)
            }
        }
    }

    pub fn remove_layer(&mut self, id: &str) -> bool {
        self.registry
            .remove_layer_by_id(&mut self.surface, &mut self.status, id)
    }

    pub fn layer_exists(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn get_layer_model(&self, id: &str) -> Option<&LayerModel> {
        self.registry.model(id)
    }

    pub fn set_layer_visibility(&mut self, id: &str, visible: bool) {
        self.registry
            .set_layer_visibility(&mut self.surface, id, visible);
    }

    pub fn set_layer_opacity(&mut self, id: &str, opacity: f64) {
        self.registry.set_layer_opacity(&mut self.surface, id, opacity);
    }

    pub fn set_layer_source_param(&mut self, id: &str, key: &str, value: &str) {
        self.registry
            .set_layer_source_param(&mut self.surface, &mut self.status, id, key, value);
    }

    /// Features fetched for a WFS layer, added as one batch: on error none of
    /// them is drawn and the resource stays pending. Deliveries for a layer
    /// removed in the meantime are dropped and return `Ok(0)`.
    pub fn deliver_features(
        &mut self,
        id: &str,
        resource: &str,
        features: Vec<Feature>,
    ) -> Result<usize, LayerError> {
        let Some(&handle) = self.registry.get_layer_by_id(id).and_then(|h| h.first()) else {
            debug!(layer = id, resource, "dropping features for removed layer");
            return Ok(0);
        };
        let owned = features
            .into_iter()
            .map(|feature| feature.with_owner(id.to_string()))
            .collect();
        let added = self.surface.add_features(handle, owned)?;
        self.status.update_complete(id, resource);
        Ok(added.len())
    }

    /// The renderer finished loading `resource` for `id`. Ignored for removed
    /// layers.
    pub fn resource_loaded(&mut self, id: &str, resource: &str) {
        if self.registry.get_layer_by_id(id).is_none() {
            debug!(layer = id, resource, "late completion for removed layer");
            return;
        }
        self.status.update_complete(id, resource);
    }

    /// Records of active layers intersecting `extent` (working SRS).
    pub fn records_in_extent(&self, extent: &Extent) -> Vec<&CatalogRecord> {
        records_in_extent(&self.registry, extent)
    }

    /// Start a freehand polygon. The returned stream emits once, when
    /// [`MapView::finish_draw_polygon`] commits the outline.
    pub fn begin_draw_polygon(&mut self) -> Topic<SelectionPolygon> {
        self.cancel_draw();
        self.dispatcher.gate_mut().close();
        let sketch = self.surface.add_layer(RenderLayer::vector());
        self.surface.start_interaction(DrawKind::Polygon);
        let done = Topic::new();
        self.draw = Some(DrawSession::Polygon {
            sketch,
            done: done.clone(),
        });
        done
    }

    /// The user closed the polygon at `now`. The outline is named, emitted on
    /// the draw stream and added to the clipboard. Returns `Ok(None)` if no
    /// polygon draw was active.
    pub fn finish_draw_polygon(
        &mut self,
        vertices: &[Vec2],
        now: Time,
    ) -> Result<Option<SelectionPolygon>, ClipboardError> {
        let Some(DrawSession::Polygon { sketch, done }) = self.draw.take() else {
            return Ok(None);
        };
        self.surface.stop_interaction();
        self.surface.remove_layer(sketch);
        self.dispatcher.gate_mut().release(now);

        let polygon = SelectionPolygon::new(
            self.clipboard.manual_name(),
            Srs::WORKING.code(),
            format_coordinates(vertices),
        );
        done.publish(polygon.clone());
        self.clipboard.add_polygon(&mut self.surface, polygon.clone())?;
        Ok(Some(
            self.clipboard
                .get(&polygon.name)
                .cloned()
                .unwrap_or(polygon),
        ))
    }

    /// Start a rectangle selection; the stream emits the box extent.
    pub fn draw_box(&mut self) -> Topic<Extent> {
        self.cancel_draw();
        self.dispatcher.gate_mut().close();
        self.surface.start_interaction(DrawKind::Box);
        let done = Topic::new();
        self.draw = Some(DrawSession::Box { done: done.clone() });
        done
    }

    pub fn finish_draw_box(&mut self, corner_a: Vec2, corner_b: Vec2, now: Time) -> Option<Extent> {
        let Some(DrawSession::Box { done }) = self.draw.take() else {
            return None;
        };
        self.surface.stop_interaction();
        self.dispatcher.gate_mut().release(now);
        let extent = Extent::from_points([corner_a, corner_b])?;
        done.publish(extent);
        Some(extent)
    }

    /// Abandon any active draw. Clicks are accepted again immediately.
    pub fn cancel_draw(&mut self) {
        let Some(session) = self.draw.take() else {
            return;
        };
        if let DrawSession::Polygon { sketch, .. } = session {
            self.surface.remove_layer(sketch);
        }
        self.surface.stop_interaction();
        self.dispatcher.gate_mut().reopen();
    }

    pub fn is_drawing(&self) -> bool {
        self.draw.is_some()
    }

    /// A marker at `coord` (working SRS) on its own layer. The handle removes
    /// it through [`MapView::remove_vector`].
    pub fn draw_dot(&mut self, coord: Vec2) -> Result<RenderLayerId, SurfaceError> {
        self.add_vector(Feature::new(Geometry::point(coord)))
    }

    /// Outline `extent` on its own layer. With a duration the outline is
    /// removed by the first [`MapView::tick`] at or after `now + duration`.
    pub fn display_extent(
        &mut self,
        extent: &Extent,
        duration_ms: Option<u64>,
        now: Time,
    ) -> Result<RenderLayerId, SurfaceError> {
        let layer = self.add_vector(Feature::new(Geometry::rectangle(extent)))?;
        if let Some(ms) = duration_ms {
            self.timed.push(TimedDisplay {
                layer,
                until: now.after_millis(ms),
            });
        }
        Ok(layer)
    }

    /// A vector layer holding just `feature`; detached again if the feature
    /// is rejected.
    fn add_vector(&mut self, feature: Feature) -> Result<RenderLayerId, SurfaceError> {
        let layer = self.surface.add_layer(RenderLayer::vector());
        if let Err(e) = self.surface.add_feature(layer, feature) {
            self.surface.remove_layer(layer);
            return Err(e);
        }
        Ok(layer)
    }

    pub fn remove_vector(&mut self, layer: RenderLayerId) -> bool {
        self.timed.retain(|t| t.layer != layer);
        self.surface.remove_layer(layer)
    }

    /// Expire timed extent outlines.
    pub fn tick(&mut self, now: Time) {
        let (expired, keep): (Vec<_>, Vec<_>) =
            self.timed.drain(..).partition(|t| now >= t.until);
        self.timed = keep;
        for t in expired {
            self.surface.remove_layer(t.layer);
        }
    }

    pub fn fit_view(&mut self, extent: &Extent) {
        self.surface.fit_extent(extent);
    }

    pub fn map_extent(&self) -> Extent {
        self.surface.view_extent()
    }

    pub fn zoom_in(&mut self) {
        self.surface.zoom_by(1);
    }

    pub fn zoom_out(&mut self) {
        self.surface.zoom_by(-1);
    }

    /// Centre and resolution, to be handed back to [`MapView::resume_map_state`].
    pub fn current_map_state(&self) -> MapState {
        self.surface.map_state()
    }

    pub fn resume_map_state(&mut self, state: MapState) {
        self.surface.set_map_state(state);
    }

    pub fn add_polygon(&mut self, polygon: SelectionPolygon) -> Result<bool, ClipboardError> {
        self.clipboard.add_polygon(&mut self.surface, polygon)
    }

    pub fn remove_polygon(&mut self, name: &str) -> Result<bool, ClipboardError> {
        self.clipboard.remove_polygon(&mut self.surface, name)
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard.clear_clipboard(&mut self.surface);
    }

    pub fn toggle_clipboard(&mut self) -> bool {
        self.clipboard.toggle_clipboard()
    }

    pub fn toggle_filter_layers(&mut self) -> bool {
        self.clipboard.toggle_filter_layers()
    }
}
