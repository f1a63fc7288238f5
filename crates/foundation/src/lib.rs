pub mod bounds;
pub mod ids;
pub mod year;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use ids::*;
pub use year::*;
