//! # PDP Sync Core
//!
//! Pure synchronization logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for providers, stores and collaborators
//! - The token manager and the CDAR parser/generator
//! - The lifecycle classifier and the flow synchronization engine
//!
//! ## Architecture Principles
//! - Only depends on `pdpsync-domain`
//! - No database or HTTP code
//! - All external dependencies via traits

pub mod auth;
pub mod cdar;
pub mod provider;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use auth::ports::{TokenEndpoint, TokenStore};
pub use auth::TokenManager;
pub use cdar::{generate_cdar, parse_cdar, CdarError};
pub use provider::ports::{CallRepository, PdpProvider};
pub use provider::{FlowApi, ProviderFactory, ProviderRegistry};
pub use sync::ports::{
    Clock, DocumentRepository, FlowLedger, InvoiceGateway, InvoiceImporter, SystemClock,
};
pub use sync::{resume_request, sync_flow, SyncContext, SyncEngine};
