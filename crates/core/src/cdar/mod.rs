//! CDAR life-cycle acknowledgement codec
//!
//! [`parse_cdar`] decodes the acknowledgement XML into
//! [`CdarDocument`](pdpsync_domain::CdarDocument); [`generate_cdar`] writes the
//! same model back out. Elements are matched by local name, so documents using
//! other namespace prefixes decode identically.

mod error;
mod generator;
mod parser;

pub use error::CdarError;
pub use generator::generate_cdar;
pub use parser::parse_cdar;

/// Local-name paths below the root element.
pub(crate) mod paths {
    pub const ROOT: &str = "CrossDomainAcknowledgementAndResponse";

    pub const GUIDELINE_ID: &str =
        "ExchangedDocumentContext/GuidelineSpecifiedDocumentContextParameter/ID";

    pub const DOCUMENT_ID: &str = "ExchangedDocument/ID";
    pub const DOCUMENT_NAME: &str = "ExchangedDocument/Name";
    pub const DOCUMENT_ISSUED: &str = "ExchangedDocument/IssueDateTime/DateTimeString";

    pub const ACK_TYPE_CODE: &str = "AcknowledgementDocument/TypeCode";
    pub const ACK_ISSUED: &str = "AcknowledgementDocument/IssueDateTime/DateTimeString";

    pub const REF_ISSUER_ASSIGNED_ID: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/IssuerAssignedID";
    pub const REF_STATUS_CODE: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/StatusCode";
    pub const REF_TYPE_CODE: &str = "AcknowledgementDocument/ReferenceReferencedDocument/TypeCode";
    pub const REF_PROCESS_CONDITION_CODE: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/ProcessConditionCode";
    pub const REF_PROCESS_CONDITION: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/ProcessCondition";
    pub const REF_REASON_CODE: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/SpecifiedDocumentStatus/ReasonCode";
    pub const REF_REASON: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/SpecifiedDocumentStatus/Reason";
    pub const REF_SEQUENCE: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/SpecifiedDocumentStatus/SequenceNumeric";
    pub const REF_NOTE: &str =
        "AcknowledgementDocument/ReferenceReferencedDocument/SpecifiedDocumentStatus/IncludedNote/Content";

    /// Paths of the children of a trade party element.
    pub struct PartyPaths {
        pub global_id: &'static str,
        pub scheme_id: &'static str,
        pub name: &'static str,
        pub role_code: &'static str,
    }

    macro_rules! party_paths {
        ($base:literal) => {
            PartyPaths {
                global_id: concat!($base, "/GlobalID"),
                scheme_id: concat!($base, "/GlobalID@schemeID"),
                name: concat!($base, "/Name"),
                role_code: concat!($base, "/RoleCode"),
            }
        };
    }

    pub const SENDER: PartyPaths = party_paths!("ExchangedDocument/SenderTradeParty");
    pub const ISSUER: PartyPaths = party_paths!("ExchangedDocument/IssuerTradeParty");
    pub const RECIPIENT: PartyPaths = party_paths!("ExchangedDocument/RecipientTradeParty");
    pub const REF_ISSUER: PartyPaths =
        party_paths!("AcknowledgementDocument/ReferenceReferencedDocument/IssuerTradeParty");
}
