use std::sync::Arc;

use super::ports::{Clock, DocumentRepository, FlowLedger, InvoiceGateway, InvoiceImporter};
use crate::provider::ports::{CallRepository, PdpProvider};

/// Collaborators of one synchronization run.
///
/// The HTTP client and token store live behind `provider`.
#[derive(Clone)]
pub struct SyncContext {
    pub provider: Arc<dyn PdpProvider>,
    pub documents: Arc<dyn DocumentRepository>,
    pub calls: Arc<dyn CallRepository>,
    pub invoices: Arc<dyn InvoiceGateway>,
    pub importer: Arc<dyn InvoiceImporter>,
    pub ledger: Arc<dyn FlowLedger>,
    pub clock: Arc<dyn Clock>,
    /// Attach raw error detail to reports
    pub debug: bool,
}

impl SyncContext {
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn entity(&self) -> &str {
        &self.provider.config().entity
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("provider", &self.provider.name())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
