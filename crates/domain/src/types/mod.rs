//! Domain types for PDP synchronization

pub mod call;
pub mod cdar;
pub mod document;
pub mod flow;
pub mod invoice;
pub mod lifecycle;
pub mod sync;
pub mod token;

pub use call::*;
pub use cdar::*;
pub use document::*;
pub use flow::*;
pub use invoice::*;
pub use lifecycle::*;
pub use sync::*;
pub use token::*;
