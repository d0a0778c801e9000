//! Session files for the `mapctl` driver: a map config, a view and the layers
//! to load, all in one JSON document.

use std::fs;
use std::path::Path;

use catalog::{CatalogRecord, LayerModel};
use foundation::math::{ProjectionError, Srs, Vec2, transform};
use layers::{ConfigError, LayerError, LayerParams, MapConfig, MapView, StatusLog};
use scene::memory::MemorySurface;
use scene::selection::SelectionPolygon;
use scene::view::Viewport;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("session parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Layer(#[from] LayerError),
}

fn default_center_srs() -> String {
    Srs::CATALOGUE.code().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// View centre, in `center_srs`.
    pub center: [f64; 2],
    #[serde(default = "default_center_srs")]
    pub center_srs: String,
    /// Map units (meters) per pixel.
    pub resolution: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            center_srs: default_center_srs(),
            resolution: 1000.0,
            width: 800.0,
            height: 600.0,
        }
    }
}

impl ViewSettings {
    pub fn viewport(&self) -> Result<Viewport, ProjectionError> {
        let from = Srs::parse(&self.center_srs)?;
        let center = transform(Vec2::from(self.center), from, Srs::WORKING);
        Ok(Viewport::new(center, self.resolution, self.width, self.height))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub config: MapConfig,
    pub view: ViewSettings,
    pub layers: Vec<LayerModel>,
    /// Records drawn straight from their bounding boxes.
    pub records: Vec<CatalogRecord>,
    pub polygons: Vec<SelectionPolygon>,
}

pub type HeadlessMap = MapView<MemorySurface, StatusLog>;

impl Session {
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let json = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Build a headless map with every layer, record and polygon loaded.
    /// Layers without a usable backend are skipped with a warning.
    pub fn open(&self) -> Result<HeadlessMap, SessionError> {
        let surface = MemorySurface::new(self.view.viewport()?)
            .with_hit_tolerance(self.config.hit_tolerance_px);
        let mut map = MapView::new(surface, StatusLog::new(), self.config.clone())?;

        for model in &self.layers {
            match map.add_layer(model.clone(), &LayerParams::default()) {
                Ok(backend) => info!(layer = %model.id, backend = backend.name(), "loaded"),
                Err(LayerError::NoSuitableBackend(id)) => {
                    warn!(layer = %id, "skipped: no suitable backend");
                }
                Err(e) => return Err(e.into()),
            }
        }
        for record in &self.records {
            map.add_csw_record(record.clone())?;
        }
        for polygon in &self.polygons {
            if let Err(e) = map.add_polygon(polygon.clone()) {
                warn!(polygon = %polygon.name, error = %e, "skipped polygon");
            }
        }
        Ok(map)
    }
}
