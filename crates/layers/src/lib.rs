pub mod backend;
pub mod click;
pub mod config;
pub mod map;
pub mod query;
pub mod records;
pub mod registry;
pub mod render_status;

pub use backend::{Backend, LayerError, LayerParams};
pub use click::{ClickResult, ResolutionError, resolve_click};
pub use config::{ConfigError, MapConfig};
pub use map::MapView;
pub use query::records_in_extent;
pub use registry::LayerRegistry;
pub use render_status::{RenderStatus, StatusEvent, StatusLog};
