//! Domain constants
//!
//! Provider defaults and the resources of the PDP flow API.

/// Resource of the token endpoint (never carries a bearer token).
pub const TOKEN_RESOURCE: &str = "token";
/// Resource of the flow search endpoint.
pub const FLOW_SEARCH_RESOURCE: &str = "flows/search";
/// Resource prefix for single flow retrieval (`flows/{flowId}`).
pub const FLOW_RESOURCE: &str = "flows";
/// Resource probed by provider health checks.
pub const HEALTH_RESOURCE: &str = "health";

pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";
/// Page size of the discovery search used to learn `total` when no limit is given.
pub const DEFAULT_DISCOVERY_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 900;
/// Window re-read behind the watermark on scheduled runs.
pub const DEFAULT_SYNC_OVERLAP_SECS: u64 = 86_400;

/// Largest response body kept verbatim in the call audit table.
pub const MAX_AUDIT_BODY_BYTES: usize = 64 * 1024;
pub const REDACTED: &str = "***";

/// Linked element type recorded on documents that point at a local invoice.
pub const LINKED_ELEMENT_INVOICE: &str = "invoice";

pub const CDAR_NAMESPACE: &str =
    "urn:un:unece:uncefact:data:standard:CrossDomainAcknowledgementAndResponse:100";
pub const RAM_NAMESPACE: &str =
    "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100";
pub const UDT_NAMESPACE: &str = "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:100";
pub const QDT_NAMESPACE: &str = "urn:un:unece:uncefact:data:standard:QualifiedDataType:100";
/// `udt:DateTimeString` format code for `YYYYMMDDHHMMSS`.
pub const CDAR_DATETIME_FORMAT: &str = "204";
