use std::collections::BTreeMap;

use catalog::LayerModel;
use foundation::ids::RenderLayerId;
use scene::layer::RenderLayer;
use scene::surface::MapSurface;
use tracing::{debug, warn};

use crate::render_status::RenderStatus;

/// Style descriptors carrying a polygon filter are dropped when a layer is
/// registered; the filter belongs to a one-off query, not the map overlay.
pub const INTERSECTS_FILTER_MARKER: &str = "<ogc:Intersects>";

/// Logical layer id to render layers, plus the model each id was added with.
///
/// Ordering contract:
/// - Ids iterate in lexicographic order.
/// - Render layers of one id keep the order they were added in.
///
/// Operations on an id that is not registered are silent no-ops.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    render_layers: BTreeMap<String, Vec<RenderLayerId>>,
    models: BTreeMap<String, LayerModel>,
    owners: BTreeMap<RenderLayerId, String>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `layer` to the surface and append it to `id`'s list.
    pub fn add_layer_by_id(
        &mut self,
        surface: &mut dyn MapSurface,
        mut layer: RenderLayer,
        id: &str,
    ) -> RenderLayerId {
        if layer
            .sld_body
            .as_deref()
            .is_some_and(|sld| sld.contains(INTERSECTS_FILTER_MARKER))
        {
            debug!(layer = id, "dropping style descriptor with polygon filter");
            layer.sld_body = None;
        }

        let handle = surface.add_layer(layer);
        self.render_layers
            .entry(id.to_string())
            .or_default()
            .push(handle);
        self.owners.insert(handle, id.to_string());
        handle
    }

    /// `None` if the id is unknown or has no render layers.
    pub fn get_layer_by_id(&self, id: &str) -> Option<&[RenderLayerId]> {
        self.render_layers
            .get(id)
            .filter(|v| !v.is_empty())
            .map(Vec::as_slice)
    }

    /// Detach every render layer of `id`, forget the id and its model, and
    /// reset its render status. Returns `false` for an unknown id.
    pub fn remove_layer_by_id(
        &mut self,
        surface: &mut dyn MapSurface,
        status: &mut dyn RenderStatus,
        id: &str,
    ) -> bool {
        let Some(handles) = self.render_layers.remove(id) else {
            debug!(layer = id, "remove: unknown layer id");
            return false;
        };
        for handle in handles {
            self.owners.remove(&handle);
            if !surface.remove_layer(handle) {
                warn!(layer = id, handle = handle.0, "render layer already detached");
            }
        }
        self.models.remove(id);
        status.reset_layer(id);
        true
    }

    pub fn set_layer_visibility(&self, surface: &mut dyn MapSurface, id: &str, visible: bool) {
        self.for_each_handle(id, "visibility", |handle| surface.set_visible(handle, visible));
    }

    /// Opacity is clamped to `[0, 1]`.
    pub fn set_layer_opacity(&self, surface: &mut dyn MapSurface, id: &str, opacity: f64) {
        let opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        self.for_each_handle(id, "opacity", |handle| surface.set_opacity(handle, opacity));
    }

    /// Update one source parameter on every render layer of `id`. The layer
    /// re-renders, so its status is reset too.
    pub fn set_layer_source_param(
        &self,
        surface: &mut dyn MapSurface,
        status: &mut dyn RenderStatus,
        id: &str,
        key: &str,
        value: &str,
    ) {
        if self.get_layer_by_id(id).is_none() {
            debug!(layer = id, "source param: unknown layer id");
            return;
        }
        self.for_each_handle(id, "source param", |handle| {
            surface.update_source_param(handle, key, value)
        });
        status.reset_layer(id);
    }

    pub fn insert_model(&mut self, model: LayerModel) {
        self.models.insert(model.id.clone(), model);
    }

    pub fn model(&self, id: &str) -> Option<&LayerModel> {
        self.models.get(id)
    }

    /// Registered if it has a model or at least one render layer.
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id) || self.get_layer_by_id(id).is_some()
    }

    /// Logical id owning a render layer.
    pub fn owner_of(&self, handle: RenderLayerId) -> Option<&str> {
        self.owners.get(&handle).map(String::as_str)
    }

    /// Ids with at least one render layer.
    pub fn active_ids(&self) -> impl Iterator<Item = &str> {
        self.render_layers
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.as_str())
    }

    pub fn models(&self) -> impl Iterator<Item = &LayerModel> {
        self.models.values()
    }

    fn for_each_handle<E: std::fmt::Display>(
        &self,
        id: &str,
        what: &str,
        mut apply: impl FnMut(RenderLayerId) -> Result<(), E>,
    ) {
        let Some(handles) = self.get_layer_by_id(id) else {
            debug!(layer = id, what, "unknown layer id");
            return;
        };
        for &handle in handles {
            if let Err(e) = apply(handle) {
                warn!(
                    layer = id,
                    handle = handle.0,
                    what,
                    error = %e,
                    "render layer update failed"
                );
            }
        }
    }
}
