//! Flow synchronization: classification of single flows and batch runs

mod classifier;
mod context;
mod engine;
pub mod ports;

pub use classifier::sync_flow;
pub use context::SyncContext;
pub use engine::{resume_request, SyncEngine};
