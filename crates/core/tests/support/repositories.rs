//! In-memory implementations of the storage and collaborator ports.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pdpsync_core::{CallRepository, DocumentRepository, FlowLedger, InvoiceGateway, InvoiceImporter};
use pdpsync_domain::{
    ApiCall, Document, FlowEffects, FlowType, ImportOutcome, Invoice, InvoiceDirection,
    InvoiceStatusChange, PdpError, ReceivedInvoice, Result as DomainResult, TimelineEvent,
};

#[derive(Default)]
struct LedgerState {
    documents: Vec<Document>,
    invoices: Vec<Invoice>,
    timeline: Vec<TimelineEvent>,
}

/// In-memory ledger implementing `DocumentRepository`, `InvoiceGateway` and
/// `FlowLedger` over shared state, so committed effects are visible to
/// subsequent lookups exactly as with the SQLite store.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a customer invoice; ids are assigned from 1.
    pub fn with_invoice(self, reference: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.invoices.len() as i64 + 1;
            state.invoices.push(Invoice {
                id,
                reference: reference.to_string(),
                direction: InvoiceDirection::Customer,
                pdp_status: None,
                pdp_status_reason: None,
                updated_at: Utc::now(),
            });
        }
        self
    }

    pub fn with_document(self, document: Document) -> Self {
        self.state.lock().unwrap().documents.push(document);
        self
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.lock().unwrap().documents.clone()
    }

    pub fn invoice(&self, reference: &str) -> Invoice {
        self.state
            .lock()
            .unwrap()
            .invoices
            .iter()
            .find(|i| i.reference == reference)
            .cloned()
            .expect("invoice seeded")
    }

    pub fn timeline(&self) -> Vec<TimelineEvent> {
        self.state.lock().unwrap().timeline.clone()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryLedger {
    async fn known_flow_ids(
        &self,
        provider: &str,
        flow_ids: &[String],
    ) -> DomainResult<HashSet<String>> {
        let wanted: HashSet<&String> = flow_ids.iter().collect();
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|d| d.provider == provider && d.flow_type != FlowType::Manual)
            .filter(|d| wanted.contains(&d.flow_id))
            .map(|d| d.flow_id.clone())
            .collect())
    }

    async fn tracking_ref_for_flow(
        &self,
        provider: &str,
        flow_id: &str,
    ) -> DomainResult<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|d| d.provider == provider && d.flow_id == flow_id)
            .find_map(|d| d.tracking_id_ref.clone()))
    }

    async fn watermark(&self, provider: &str) -> DomainResult<Option<DateTime<Utc>>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|d| d.provider == provider && d.flow_type != FlowType::Manual)
            .map(|d| d.updated_at)
            .max())
    }

    async fn documents_for_flow(&self, flow_id: &str) -> DomainResult<Vec<Document>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|d| d.flow_id == flow_id)
            .cloned()
            .collect())
    }

    async fn record_manual_submission(&self, document: &Document) -> DomainResult<i64> {
        let mut state = self.state.lock().unwrap();
        state.documents.push(document.clone());
        Ok(state.documents.len() as i64)
    }
}

#[async_trait]
impl InvoiceGateway for InMemoryLedger {
    async fn find_by_reference(&self, reference: &str) -> DomainResult<Option<Invoice>> {
        Ok(self.state.lock().unwrap().invoices.iter().find(|i| i.reference == reference).cloned())
    }

    async fn set_status(&self, change: &InvoiceStatusChange) -> DomainResult<()> {
        let mut state = self.state.lock().unwrap();
        let invoice = state
            .invoices
            .iter_mut()
            .find(|i| i.id == change.invoice_id)
            .ok_or_else(|| PdpError::NotFound(format!("invoice {}", change.invoice_id)))?;
        invoice.pdp_status = Some(change.status);
        invoice.pdp_status_reason = change.reason.clone();
        Ok(())
    }

    async fn log_timeline_event(&self, event: &TimelineEvent) -> DomainResult<()> {
        self.state.lock().unwrap().timeline.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl FlowLedger for InMemoryLedger {
    async fn commit_flow(&self, effects: &FlowEffects) -> DomainResult<i64> {
        if let Some(change) = &effects.invoice_status {
            self.set_status(change).await?;
        }
        if let Some(event) = &effects.timeline {
            self.log_timeline_event(event).await?;
        }
        let mut state = self.state.lock().unwrap();
        state.documents.push(effects.document.clone());
        Ok(state.documents.len() as i64)
    }
}

/// In-memory mock for `CallRepository`; only summaries are observed.
#[derive(Default, Clone)]
pub struct MockCallRepository {
    summaries: Arc<Mutex<HashMap<i64, String>>>,
}

impl MockCallRepository {
    pub fn summary(&self, call_id: i64) -> Option<String> {
        self.summaries.lock().unwrap().get(&call_id).cloned()
    }
}

#[async_trait]
impl CallRepository for MockCallRepository {
    async fn insert_call(&self, _call: &ApiCall) -> DomainResult<i64> {
        Ok(0)
    }

    async fn record_summary(&self, call_id: i64, summary: &str) -> DomainResult<()> {
        self.summaries.lock().unwrap().insert(call_id, summary.to_string());
        Ok(())
    }

    async fn find_call(&self, _call_id: i64) -> DomainResult<Option<ApiCall>> {
        Ok(None)
    }
}

/// Importer treating a flow as a duplicate when its tracking id was seen.
#[derive(Default, Clone)]
pub struct MockImporter {
    imported: Arc<Mutex<Vec<ReceivedInvoice>>>,
    existing: Arc<Mutex<HashSet<String>>>,
}

impl MockImporter {
    pub fn with_existing(self, tracking_id: &str) -> Self {
        self.existing.lock().unwrap().insert(tracking_id.to_string());
        self
    }

    pub fn imported(&self) -> Vec<ReceivedInvoice> {
        self.imported.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvoiceImporter for MockImporter {
    async fn import(&self, received: &ReceivedInvoice) -> DomainResult<ImportOutcome> {
        let key = received.flow.tracking_id.clone().unwrap_or_default();
        if self.existing.lock().unwrap().contains(&key) {
            return Ok(ImportOutcome::AlreadyExists { invoice_id: Some(900) });
        }
        let mut imported = self.imported.lock().unwrap();
        imported.push(received.clone());
        Ok(ImportOutcome::Created { invoice_id: 1000 + imported.len() as i64 })
    }
}
