pub mod feature;
pub mod geometry;
pub mod layer;
pub mod memory;
pub mod picking;
pub mod selection;
pub mod surface;
pub mod view;

pub use feature::*;
pub use geometry::*;
pub use layer::*;
pub use memory::*;
pub use surface::*;
pub use view::*;
