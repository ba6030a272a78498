//! Local invoices touched by synchronization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::flow::Flow;
use super::lifecycle::PdpInvoiceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceDirection {
    Customer,
    Supplier,
}

crate::impl_domain_status_conversions!(InvoiceDirection {
    Customer => "customer",
    Supplier => "supplier",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    /// Tracking reference shared with the provider.
    pub reference: String,
    pub direction: InvoiceDirection,
    pub pdp_status: Option<PdpInvoiceStatus>,
    pub pdp_status_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Status update applied to an invoice when a flow is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStatusChange {
    pub invoice_id: i64,
    pub status: PdpInvoiceStatus,
    pub reason: Option<String>,
}

/// Entry for the invoice timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub invoice_id: i64,
    pub label: String,
    pub message: String,
}

/// Files received for a supplier invoice flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedInvoice {
    pub flow: Flow,
    /// Converted (structured) invoice document.
    pub document: Vec<u8>,
    /// Human readable rendition, usually a PDF.
    pub readable: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportOutcome {
    Created { invoice_id: i64 },
    AlreadyExists { invoice_id: Option<i64> },
}

impl ImportOutcome {
    pub fn invoice_id(&self) -> Option<i64> {
        match self {
            Self::Created { invoice_id } => Some(*invoice_id),
            Self::AlreadyExists { invoice_id } => *invoice_id,
        }
    }
}
