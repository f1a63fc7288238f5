pub mod area;
pub mod change;

pub use area::*;
pub use change::*;
