//! Port interfaces for flow synchronization

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pdpsync_domain::{
    Document, FlowEffects, ImportOutcome, Invoice, InvoiceStatusChange, ReceivedInvoice, Result,
    TimelineEvent,
};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Read side of the document ledger
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Subset of `flow_ids` already recorded by a non-manual row
    async fn known_flow_ids(&self, provider: &str, flow_ids: &[String]) -> Result<HashSet<String>>;

    /// Tracking reference recorded by an earlier row for this flow
    async fn tracking_ref_for_flow(&self, provider: &str, flow_id: &str)
        -> Result<Option<String>>;

    /// Latest `updated_at` ingested for the provider, manual rows excluded
    async fn watermark(&self, provider: &str) -> Result<Option<DateTime<Utc>>>;

    /// All rows recorded for a flow, oldest first
    async fn documents_for_flow(&self, flow_id: &str) -> Result<Vec<Document>>;

    /// Record an invoice pushed to the provider outside a sync run
    async fn record_manual_submission(&self, document: &Document) -> Result<i64>;
}

/// Host invoice store
#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Invoice>>;

    async fn set_status(&self, change: &InvoiceStatusChange) -> Result<()>;

    async fn log_timeline_event(&self, event: &TimelineEvent) -> Result<()>;
}

/// Creates local invoices from received supplier documents
#[async_trait]
pub trait InvoiceImporter: Send + Sync {
    async fn import(&self, received: &ReceivedInvoice) -> Result<ImportOutcome>;
}

/// Applies the effects of one flow atomically
#[async_trait]
pub trait FlowLedger: Send + Sync {
    /// Write status, timeline and ledger row in one transaction.
    /// Returns the id of the inserted document.
    async fn commit_flow(&self, effects: &FlowEffects) -> Result<i64>;
}
