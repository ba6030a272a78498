//! # PDP Sync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories (tokens, calls, documents, invoices, flow ledger)
//! - The reqwest HTTP client and the PDP API client with call logging
//! - The inbox importer for received supplier invoices
//! - Configuration loading, tracing initialisation and the sync scheduler
//!
//! ## Architecture
//! - Implements traits defined in `pdpsync-core`
//! - Depends on `pdpsync-domain` and `pdpsync-core`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;
pub mod pdp;
pub mod scheduling;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteCallRepository, SqliteDocumentRepository, SqliteFlowLedger,
    SqliteInvoiceGateway, SqliteTokenStore,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, LogFormat};
pub use pdp::{InboxImporter, PdpApiClient};
pub use scheduling::{SyncScheduler, SyncSchedulerConfig};
