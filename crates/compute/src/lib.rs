pub mod analysis;
pub mod display;

pub use analysis::*;
