pub mod projection;
pub mod simplify;
pub mod vec;

pub use projection::*;
pub use simplify::*;
pub use vec::*;
