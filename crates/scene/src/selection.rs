//! Selection clipboard: named polygons in the working SRS.
//!
//! Polygons arrive in any supported SRS as `"x,y x,y ..."` strings, are
//! reprojected and thinned to a vertex budget, and are stored once per name.
//! Every mutation republishes the full set on a replay-latest stream and
//! redraws all outlines on a single vector layer.

use foundation::ids::RenderLayerId;
use foundation::math::{ProjectionError, Srs, Vec2, simplify_to, transform};
use runtime::event_bus::Topic;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::feature::Feature;
use crate::geometry::Geometry;
use crate::layer::RenderLayer;
use crate::surface::{MapSurface, SurfaceError};

/// Vertex budget applied to every stored polygon.
pub const DEFAULT_TARGET_VERTICES: usize = 100;

/// Prefix of names given to polygons drawn on the map.
pub const MANUAL_NAME_PREFIX: &str = "manual-";

const MANUAL_NAME_SPACE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPolygon {
    pub name: String,
    pub srs: String,
    /// Space-separated `x,y` pairs.
    pub coordinates: String,
    #[serde(skip)]
    pub render_handle: Option<RenderLayerId>,
}

impl SelectionPolygon {
    pub fn new(
        name: impl Into<String>,
        srs: impl Into<String>,
        coordinates: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            srs: srs.into(),
            coordinates: coordinates.into(),
            render_handle: None,
        }
    }

    pub fn vertices(&self) -> Result<Vec<Vec2>, ClipboardError> {
        parse_coordinates(&self.coordinates)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClipboardError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("malformed coordinate list: {0}")]
    MalformedCoordinates(String),
    #[error("polygon `{name}` has {count} vertices, need at least 3")]
    TooFewVertices { name: String, count: usize },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Parse `"x,y x,y ..."`. Whitespace and commas both separate numbers; the
/// count must be even.
pub fn parse_coordinates(text: &str) -> Result<Vec<Vec2>, ClipboardError> {
    let numbers = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| ClipboardError::MalformedCoordinates(format!("`{t}` is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if numbers.len() % 2 != 0 {
        return Err(ClipboardError::MalformedCoordinates(format!(
            "odd number of values ({})",
            numbers.len()
        )));
    }
    Ok(numbers
        .chunks_exact(2)
        .map(|pair| Vec2::new(pair[0], pair[1]))
        .collect())
}

pub fn format_coordinates(points: &[Vec2]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Owns the polygon set and the outline layer that renders it.
///
/// Ordering contract: polygons keep insertion order; subscribers to
/// [`Clipboard::polygons_stream`] always receive the complete set.
#[derive(Debug)]
pub struct Clipboard {
    polygons: Vec<SelectionPolygon>,
    target_vertices: usize,
    outline: Option<RenderLayerId>,
    stream: Topic<Vec<SelectionPolygon>>,
    visible: bool,
    visible_stream: Topic<bool>,
    filter_layers: bool,
    filter_stream: Topic<bool>,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_VERTICES)
    }
}

impl Clipboard {
    pub fn new(target_vertices: usize) -> Self {
        Self {
            polygons: Vec::new(),
            target_vertices,
            outline: None,
            stream: Topic::with_value(Vec::new()),
            visible: false,
            visible_stream: Topic::with_value(false),
            filter_layers: false,
            filter_stream: Topic::with_value(false),
        }
    }

    pub fn target_vertices(&self) -> usize {
        self.target_vertices
    }

    pub fn polygons(&self) -> &[SelectionPolygon] {
        &self.polygons
    }

    pub fn get(&self, name: &str) -> Option<&SelectionPolygon> {
        self.polygons.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Handle of the layer currently drawing the outlines.
    pub fn outline_layer(&self) -> Option<RenderLayerId> {
        self.outline
    }

    pub fn polygons_stream(&self) -> Topic<Vec<SelectionPolygon>> {
        self.stream.clone()
    }

    pub fn visible_stream(&self) -> Topic<bool> {
        self.visible_stream.clone()
    }

    pub fn filter_layers_stream(&self) -> Topic<bool> {
        self.filter_stream.clone()
    }

    /// Store `polygon` in the working SRS. Returns `Ok(false)` if a polygon
    /// with the same name is already held; nothing changes in that case.
    pub fn add_polygon(
        &mut self,
        surface: &mut dyn MapSurface,
        polygon: SelectionPolygon,
    ) -> Result<bool, ClipboardError> {
        if self.contains(&polygon.name) {
            debug!(name = %polygon.name, "clipboard already holds polygon");
            return Ok(false);
        }

        let from = Srs::parse(&polygon.srs)?;
        let vertices = polygon.vertices()?;
        if vertices.len() < 3 {
            return Err(ClipboardError::TooFewVertices {
                name: polygon.name,
                count: vertices.len(),
            });
        }

        let projected: Vec<Vec2> = vertices
            .into_iter()
            .map(|p| transform(p, from, Srs::WORKING))
            .collect();
        let simplified = simplify_to(&projected, self.target_vertices);

        let mut next = self.polygons.clone();
        next.push(SelectionPolygon {
            name: polygon.name.clone(),
            srs: Srs::WORKING.code().to_string(),
            coordinates: format_coordinates(&simplified),
            render_handle: None,
        });
        self.commit(surface, next)?;
        info!(
            name = %polygon.name,
            from = from.code(),
            vertices = projected.len(),
            kept = simplified.len(),
            "clipboard polygon added"
        );
        Ok(true)
    }

    pub fn remove_polygon(
        &mut self,
        surface: &mut dyn MapSurface,
        name: &str,
    ) -> Result<bool, ClipboardError> {
        if !self.contains(name) {
            return Ok(false);
        }
        let next = self
            .polygons
            .iter()
            .filter(|p| p.name != name)
            .cloned()
            .collect();
        self.commit(surface, next)?;
        debug!(name, "clipboard polygon removed");
        Ok(true)
    }

    pub fn clear_clipboard(&mut self, surface: &mut dyn MapSurface) {
        self.polygons.clear();
        self.remove_outline(surface);
        self.publish();
    }

    /// A fresh `manual-N` name not held by any stored polygon.
    pub fn manual_name(&self) -> String {
        let random = (uuid::Uuid::new_v4().as_u128() % u128::from(MANUAL_NAME_SPACE)) as u32;
        for i in 0..MANUAL_NAME_SPACE {
            let n = (random + i) % MANUAL_NAME_SPACE;
            let name = format!("{MANUAL_NAME_PREFIX}{n}");
            if !self.contains(&name) {
                return name;
            }
        }
        format!("{MANUAL_NAME_PREFIX}{random}")
    }

    pub fn toggle_clipboard(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible_stream.publish(self.visible);
        self.visible
    }

    pub fn toggle_filter_layers(&mut self) -> bool {
        self.filter_layers = !self.filter_layers;
        self.filter_stream.publish(self.filter_layers);
        self.filter_layers
    }

    fn publish(&self) {
        self.stream.publish(self.polygons.clone());
    }

    fn remove_outline(&mut self, surface: &mut dyn MapSurface) {
        if let Some(id) = self.outline.take() {
            surface.remove_layer(id);
        }
        for polygon in &mut self.polygons {
            polygon.render_handle = None;
        }
    }

    /// Make `polygons` the stored set. The new outline layer is drawn first;
    /// if that fails the stored set, the old outline and the stream are left
    /// as they were.
    fn commit(
        &mut self,
        surface: &mut dyn MapSurface,
        mut polygons: Vec<SelectionPolygon>,
    ) -> Result<(), ClipboardError> {
        let outline = draw_outline(surface, &polygons)?;
        if let Some(old) = self.outline.take() {
            surface.remove_layer(old);
        }
        for polygon in &mut polygons {
            polygon.render_handle = outline;
        }
        self.polygons = polygons;
        self.outline = outline;
        self.publish();
        Ok(())
    }
}

/// One vector layer holding every outline, or `None` for an empty set.
fn draw_outline(
    surface: &mut dyn MapSurface,
    polygons: &[SelectionPolygon],
) -> Result<Option<RenderLayerId>, ClipboardError> {
    if polygons.is_empty() {
        return Ok(None);
    }
    let features = polygons
        .iter()
        .map(|polygon| -> Result<Feature, ClipboardError> {
            let ring = parse_coordinates(&polygon.coordinates)?;
            Ok(Feature::new(Geometry::polygon(ring))
                .with_name(polygon.name.clone())
                .clipboard_outline())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let layer = surface.add_layer(RenderLayer::vector());
    if let Err(e) = surface.add_features(layer, features) {
        surface.remove_layer(layer);
        return Err(e.into());
    }
    Ok(Some(layer))
}
