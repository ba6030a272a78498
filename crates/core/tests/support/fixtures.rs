//! Flow, acknowledgement and context fixtures.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pdpsync_core::{generate_cdar, Clock, SyncContext};
use pdpsync_domain::{
    AckStatus, Acknowledgement, AcknowledgementDocument, CdarDocument, ExchangedDocument, Flow,
    FlowType, LifecycleCode, ReferencedDocument, TradeParty,
};

use super::provider::MockProvider;
use super::repositories::{InMemoryLedger, MockCallRepository, MockImporter};

/// Clock frozen at a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

/// `base_time()` plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minutes)
}

pub fn flow(flow_id: &str, flow_type: FlowType, updated_minutes: i64) -> Flow {
    Flow {
        flow_id: flow_id.to_string(),
        tracking_id: None,
        flow_type,
        flow_direction: None,
        flow_syntax: Some("CII".to_string()),
        flow_profile: None,
        submitted_at: Some(at(updated_minutes - 1)),
        updated_at: at(updated_minutes),
        uuid: None,
        acknowledgement: Some(Acknowledgement {
            status: AckStatus::Ok,
            reason_code: None,
            info: None,
        }),
    }
}

pub fn customer_flow(flow_id: &str, tracking_id: &str, updated_minutes: i64) -> Flow {
    Flow {
        tracking_id: Some(tracking_id.to_string()),
        ..flow(flow_id, FlowType::CustomerInvoice, updated_minutes)
    }
}

pub fn rejected(mut flow: Flow, info: &str) -> Flow {
    flow.acknowledgement = Some(Acknowledgement {
        status: AckStatus::Error,
        reason_code: Some("REJ_SEMAN".to_string()),
        info: Some(info.to_string()),
    });
    flow
}

/// Life-cycle acknowledgement for `reference` carrying `code`.
pub fn cdar_xml(reference: &str, code: LifecycleCode, reason: Option<&str>) -> String {
    generate_cdar(&CdarDocument {
        guideline_id: "urn.cpro.gouv.fr:1p0:CDV:invoice".to_string(),
        exchanged_document: ExchangedDocument {
            id: format!("CDV-{reference}"),
            name: None,
            issue_date_time: "20250301090000".to_string(),
            sender: TradeParty::new("PDP01"),
            issuer: TradeParty::new("123456789"),
            recipient: TradeParty::new("987654321"),
        },
        acknowledgement_document: AcknowledgementDocument {
            type_code: "23".to_string(),
            issue_date_time: "20250301090000".to_string(),
            referenced_document: ReferencedDocument {
                issuer_assigned_id: reference.to_string(),
                status_code: "10".to_string(),
                type_code: "380".to_string(),
                process_condition_code: code,
                process_condition: code.label().to_string(),
                issuer_trade_party: TradeParty::new("123456789"),
                status_reason_code: reason.map(|_| "OTHER".to_string()),
                status_reason: reason.map(str::to_string),
                status_sequence_numeric: None,
                status_included_note_content: None,
            },
        },
    })
}

/// Wired context over the in-memory doubles.
pub struct Harness {
    pub provider: Arc<MockProvider>,
    pub ledger: InMemoryLedger,
    pub calls: MockCallRepository,
    pub importer: MockImporter,
    pub ctx: SyncContext,
}

impl Harness {
    pub fn new(provider: MockProvider, ledger: InMemoryLedger) -> Self {
        Self::with_importer(provider, ledger, MockImporter::default())
    }

    pub fn with_importer(provider: MockProvider, ledger: InMemoryLedger, importer: MockImporter) -> Self {
        let provider = Arc::new(provider);
        let calls = MockCallRepository::default();
        let ctx = SyncContext {
            provider: provider.clone(),
            documents: Arc::new(ledger.clone()),
            calls: Arc::new(calls.clone()),
            invoices: Arc::new(ledger.clone()),
            importer: Arc::new(importer.clone()),
            ledger: Arc::new(ledger.clone()),
            clock: Arc::new(FixedClock(at(600))),
            debug: false,
        };
        Self { provider, ledger, calls, importer, ctx }
    }
}
