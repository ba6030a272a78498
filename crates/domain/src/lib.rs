//! # PDP Sync Domain
//!
//! Business domain types for the Public Dematerialization Platform (PDP)
//! synchronization subsystem.
//!
//! This crate contains:
//! - Remote flow and local ledger types (`Flow`, `Document`, `ApiCall`)
//! - OAuth token model keyed by provider/environment/tenant
//! - The CDAR acknowledgement model and the 200–213 lifecycle vocabulary
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other pdpsync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
