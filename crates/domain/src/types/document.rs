//! Local ledger of ingested flow events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cdar::CdarDocument;
use super::flow::{AckStatus, Flow, FlowType};
use super::lifecycle::LifecycleCode;
use crate::constants::LINKED_ELEMENT_INVOICE;

/// One row of the document ledger.
///
/// A non-manual `flow_id` appears at most once in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub flow_id: String,
    pub tracking_id_ref: Option<String>,
    pub flow_type: FlowType,
    pub ack_status: AckStatus,
    pub ack_reason_code: Option<String>,
    pub ack_info: Option<String>,
    pub cdar_lifecycle_code: Option<LifecycleCode>,
    pub cdar_lifecycle_label: Option<String>,
    pub cdar_reason_code: Option<String>,
    pub cdar_reason_desc: Option<String>,
    pub cdar_reason_detail: Option<String>,
    pub linked_element_id: Option<i64>,
    pub linked_element_type: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub provider: String,
    pub entity: String,
    pub call_id: Option<i64>,
}

impl Document {
    /// Ledger row for a remote flow, acknowledgement fields copied over.
    pub fn from_flow(
        flow: &Flow,
        provider: impl Into<String>,
        entity: impl Into<String>,
        call_id: Option<i64>,
    ) -> Self {
        let ack = flow.acknowledgement.clone().unwrap_or_default();
        Self {
            id: None,
            flow_id: flow.flow_id.clone(),
            tracking_id_ref: flow.tracking_id.clone(),
            flow_type: flow.flow_type,
            ack_status: ack.status,
            ack_reason_code: ack.reason_code,
            ack_info: ack.info,
            cdar_lifecycle_code: None,
            cdar_lifecycle_label: None,
            cdar_reason_code: None,
            cdar_reason_desc: None,
            cdar_reason_detail: None,
            linked_element_id: None,
            linked_element_type: None,
            submitted_at: flow.submitted_at,
            updated_at: flow.updated_at,
            provider: provider.into(),
            entity: entity.into(),
            call_id,
        }
    }

    /// Ledger row for an invoice pushed to the provider outside a sync run.
    pub fn manual_submission(
        flow_id: impl Into<String>,
        tracking_id_ref: impl Into<String>,
        invoice_id: i64,
        provider: impl Into<String>,
        entity: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            flow_id: flow_id.into(),
            tracking_id_ref: Some(tracking_id_ref.into()),
            flow_type: FlowType::Manual,
            ack_status: AckStatus::Pending,
            ack_reason_code: None,
            ack_info: None,
            cdar_lifecycle_code: None,
            cdar_lifecycle_label: None,
            cdar_reason_code: None,
            cdar_reason_desc: None,
            cdar_reason_detail: None,
            linked_element_id: Some(invoice_id),
            linked_element_type: Some(LINKED_ELEMENT_INVOICE.to_string()),
            submitted_at: Some(submitted_at),
            updated_at: submitted_at,
            provider: provider.into(),
            entity: entity.into(),
            call_id: None,
        }
    }

    #[must_use]
    pub fn linked_to_invoice(mut self, invoice_id: i64) -> Self {
        self.linked_element_id = Some(invoice_id);
        self.linked_element_type = Some(LINKED_ELEMENT_INVOICE.to_string());
        self
    }

    #[must_use]
    pub fn with_tracking_ref(mut self, tracking_id_ref: impl Into<String>) -> Self {
        self.tracking_id_ref = Some(tracking_id_ref.into());
        self
    }

    /// Copy the decoded life-cycle status and reason fields.
    #[must_use]
    pub fn with_cdar(mut self, cdar: &CdarDocument) -> Self {
        let referenced = cdar.referenced();
        let code = referenced.process_condition_code;
        self.cdar_lifecycle_code = Some(code);
        self.cdar_lifecycle_label = Some(code.label().to_string());
        self.cdar_reason_code = referenced.status_reason_code.clone();
        self.cdar_reason_desc = referenced.status_reason.clone();
        self.cdar_reason_detail = referenced.status_included_note_content.clone();
        if self.tracking_id_ref.is_none() {
            self.tracking_id_ref = Some(referenced.issuer_assigned_id.clone());
        }
        self
    }
}
