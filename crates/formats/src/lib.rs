pub mod collection;
pub mod normalize;
pub mod registry;
pub mod tileset;

pub use collection::*;
pub use registry::*;
pub use tileset::*;
