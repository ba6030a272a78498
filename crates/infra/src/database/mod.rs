//! Database implementations

pub mod call_repository;
pub mod document_repository;
pub mod invoice_repository;
pub mod manager;
mod rows;
pub mod token_repository;

pub use call_repository::SqliteCallRepository;
pub use document_repository::{SqliteDocumentRepository, SqliteFlowLedger};
pub use invoice_repository::SqliteInvoiceGateway;
pub use manager::{DbManager, SqliteConnection};
pub use token_repository::SqliteTokenStore;
