//! # PDP Sync runner
//!
//! Wires the infrastructure adapters into sync contexts and drives the
//! scheduler. The binary in `main.rs` is a thin shell over [`AppContext`].

pub mod context;

pub use context::AppContext;
