pub mod binder;
pub mod controls;
pub mod driver;
pub mod event_bus;

pub use binder::*;
pub use controls::*;
pub use driver::*;
pub use event_bus::*;
