pub mod event_bus;
pub mod gate;

pub use event_bus::*;
pub use gate::*;
