//! PDP provider adapters

pub mod client;
pub mod importer;

pub use client::PdpApiClient;
pub use importer::InboxImporter;
