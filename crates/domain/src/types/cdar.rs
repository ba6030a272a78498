//! Cross-Domain Acknowledgement and Response (CDAR) model
//!
//! Only the subset of the message used for invoice life-cycle reporting is
//! modelled. Mandatory nodes are plain fields, optional ones are `Option`.

use serde::{Deserialize, Serialize};

use super::lifecycle::LifecycleCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeParty {
    pub global_id: String,
    /// `schemeID` attribute of the global identifier (e.g. `0225`).
    pub scheme_id: Option<String>,
    pub name: Option<String>,
    pub role_code: Option<String>,
}

impl TradeParty {
    pub fn new(global_id: impl Into<String>) -> Self {
        Self { global_id: global_id.into(), scheme_id: None, name: None, role_code: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangedDocument {
    pub id: String,
    pub name: Option<String>,
    /// `YYYYMMDDHHMMSS`, kept as sent.
    pub issue_date_time: String,
    pub sender: TradeParty,
    pub issuer: TradeParty,
    pub recipient: TradeParty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedDocument {
    /// Business reference of the invoice the status applies to.
    pub issuer_assigned_id: String,
    pub status_code: String,
    pub type_code: String,
    /// Authoritative life-cycle status. Never defaulted.
    pub process_condition_code: LifecycleCode,
    pub process_condition: String,
    pub issuer_trade_party: TradeParty,
    pub status_reason_code: Option<String>,
    pub status_reason: Option<String>,
    pub status_sequence_numeric: Option<u32>,
    pub status_included_note_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgementDocument {
    pub type_code: String,
    pub issue_date_time: String,
    pub referenced_document: ReferencedDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdarDocument {
    pub guideline_id: String,
    pub exchanged_document: ExchangedDocument,
    pub acknowledgement_document: AcknowledgementDocument,
}

impl CdarDocument {
    pub fn referenced(&self) -> &ReferencedDocument {
        &self.acknowledgement_document.referenced_document
    }

    pub fn lifecycle_code(&self) -> LifecycleCode {
        self.referenced().process_condition_code
    }
}
