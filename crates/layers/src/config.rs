use foundation::math::{ProjectionError, Srs};
use runtime::gate::DEFAULT_SETTLE_MS;
use scene::memory::DEFAULT_HIT_TOLERANCE_PX;
use scene::selection::DEFAULT_TARGET_VERTICES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("working SRS must be {expected}, got {got}")]
    WorkingSrs { expected: &'static str, got: String },
}

/// Map engine settings. Every field has a default, so a partial JSON object
/// (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub working_srs: String,
    /// Delay after a draw ends before map clicks are accepted again.
    pub click_settle_ms: u64,
    pub clipboard_target_vertices: usize,
    pub hit_tolerance_px: f64,
    /// Layer ids always drawn from their catalogue records.
    pub csw_renderer_ids: Vec<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            working_srs: Srs::WORKING.code().to_string(),
            click_settle_ms: DEFAULT_SETTLE_MS,
            clipboard_target_vertices: DEFAULT_TARGET_VERTICES,
            hit_tolerance_px: DEFAULT_HIT_TOLERANCE_PX,
            csw_renderer_ids: Vec::new(),
        }
    }
}

impl MapConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The view and the clipboard only work in Web Mercator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let srs = Srs::parse(&self.working_srs)?;
        if srs != Srs::WORKING {
            return Err(ConfigError::WorkingSrs {
                expected: Srs::WORKING.code(),
                got: self.working_srs.clone(),
            });
        }
        Ok(())
    }

    pub fn is_csw_renderer(&self, layer_id: &str) -> bool {
        self.csw_renderer_ids.iter().any(|id| id == layer_id)
    }
}
