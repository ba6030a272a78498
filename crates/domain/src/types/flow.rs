//! Remote flows as described by the PDP flow API

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Business category of a flow.
///
/// Unknown or empty wire values decode to [`FlowType::Unclassified`];
/// [`FlowType::Manual`] only exists in the local ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum FlowType {
    CustomerInvoice,
    SupplierInvoice,
    CustomerInvoiceLC,
    SupplierInvoiceLC,
    #[default]
    Unclassified,
    Manual,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerInvoice => "CustomerInvoice",
            Self::SupplierInvoice => "SupplierInvoice",
            Self::CustomerInvoiceLC => "CustomerInvoiceLC",
            Self::SupplierInvoiceLC => "SupplierInvoiceLC",
            Self::Unclassified => "Unclassified",
            Self::Manual => "manual",
        }
    }
}

impl From<&str> for FlowType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "CustomerInvoice" => Self::CustomerInvoice,
            "SupplierInvoice" => Self::SupplierInvoice,
            "CustomerInvoiceLC" => Self::CustomerInvoiceLC,
            "SupplierInvoiceLC" => Self::SupplierInvoiceLC,
            v if v.eq_ignore_ascii_case("manual") => Self::Manual,
            _ => Self::Unclassified,
        }
    }
}

impl From<Option<String>> for FlowType {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map_or(Self::Unclassified, Self::from)
    }
}

impl From<FlowType> for String {
    fn from(value: FlowType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider acknowledgement status of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AckStatus {
    #[default]
    Pending,
    Ok,
    Error,
}

impl_domain_status_conversions!(AckStatus {
    Pending => "pending",
    Ok => "ok",
    Error => "error",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    #[serde(default)]
    pub status: AckStatus,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

/// One flow as returned by search or metadata retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub flow_id: String,
    /// Business reference of the invoice. Absent on life-cycle and
    /// unclassified flows.
    #[serde(default)]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub flow_type: FlowType,
    #[serde(default)]
    pub flow_direction: Option<String>,
    #[serde(default)]
    pub flow_syntax: Option<String>,
    #[serde(default)]
    pub flow_profile: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub acknowledgement: Option<Acknowledgement>,
}

impl Flow {
    pub fn ack_status(&self) -> AckStatus {
        self.acknowledgement.as_ref().map(|a| a.status).unwrap_or_default()
    }
}

/// Body of a flow search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSearchQuery {
    pub updated_after: DateTime<Utc>,
    pub limit: u32,
}

impl FlowSearchQuery {
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "where": {
                "updatedAfter": self.updated_after.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
            "limit": self.limit,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub results: Vec<Flow>,
}

/// Representation requested from `flows/{flowId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    Metadata,
    Original,
    Converted,
    ReadableView,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "Metadata",
            Self::Original => "Original",
            Self::Converted => "Converted",
            Self::ReadableView => "ReadableView",
        }
    }

    /// `Accept` override for binary representations.
    pub fn accept(&self) -> Option<&'static str> {
        match self {
            Self::Metadata => None,
            Self::Original | Self::Converted => Some("application/octet-stream"),
            Self::ReadableView => Some("application/pdf"),
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
