//! Invoice life-cycle vocabulary (codes 200 to 213)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PdpError;

/// Normalized life-cycle status carried by `ProcessConditionCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u16)]
pub enum LifecycleCode {
    Submitted = 200,
    Issued = 201,
    Received = 202,
    MadeAvailable = 203,
    InHand = 204,
    Approved = 205,
    PartiallyApproved = 206,
    Disputed = 207,
    Suspended = 208,
    Completed = 209,
    Refused = 210,
    PaymentTransmitted = 211,
    Paid = 212,
    Rejected = 213,
}

impl LifecycleCode {
    pub const ALL: [LifecycleCode; 14] = [
        Self::Submitted,
        Self::Issued,
        Self::Received,
        Self::MadeAvailable,
        Self::InHand,
        Self::Approved,
        Self::PartiallyApproved,
        Self::Disputed,
        Self::Suspended,
        Self::Completed,
        Self::Refused,
        Self::PaymentTransmitted,
        Self::Paid,
        Self::Rejected,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Issued => "Issued",
            Self::Received => "Received",
            Self::MadeAvailable => "Made available",
            Self::InHand => "In hand",
            Self::Approved => "Approved",
            Self::PartiallyApproved => "Partially approved",
            Self::Disputed => "Disputed",
            Self::Suspended => "Suspended",
            Self::Completed => "Completed",
            Self::Refused => "Refused",
            Self::PaymentTransmitted => "Payment transmitted",
            Self::Paid => "Paid",
            Self::Rejected => "Rejected",
        }
    }
}

impl TryFrom<u16> for LifecycleCode {
    type Error = PdpError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.code() == value)
            .ok_or_else(|| PdpError::Validation(format!("lifecycle code {value} outside 200..=213")))
    }
}

impl From<LifecycleCode> for u16 {
    fn from(value: LifecycleCode) -> Self {
        value.code()
    }
}

impl fmt::Display for LifecycleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.label())
    }
}

/// Status written onto a local invoice by synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code")]
pub enum PdpInvoiceStatus {
    Lifecycle(LifecycleCode),
    /// The provider rejected the exchange itself.
    Error,
}

impl PdpInvoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lifecycle(code) => code.label(),
            Self::Error => "Error",
        }
    }

    pub fn lifecycle_code(&self) -> Option<LifecycleCode> {
        match self {
            Self::Lifecycle(code) => Some(*code),
            Self::Error => None,
        }
    }
}

impl fmt::Display for PdpInvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
