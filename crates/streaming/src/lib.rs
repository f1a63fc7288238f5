pub mod pipeline;
pub mod request;
pub mod residency;
pub mod source;
pub mod store;

pub use pipeline::*;
pub use request::*;
pub use residency::*;
pub use source::*;
pub use store::*;
