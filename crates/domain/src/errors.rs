//! Error types used throughout the synchronization subsystem

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for PDP synchronization
///
/// Duplicate flows are not errors: they surface as
/// [`FlowOutcome::Skipped`](crate::FlowOutcome::Skipped).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum PdpError {
    /// Token endpoint failure. Blocks the whole run.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network failure, timeout or non-2xx answer from the provider.
    /// `status` is 0 when no HTTP response was received.
    #[error("Transport error (HTTP {status}): {message}")]
    Transport { status: u16, message: String },

    /// Malformed provider payload (CDAR parse failure, unexpected JSON).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced business object is missing locally.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdpError {
    /// Build a transport error for a failure without HTTP response.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Transport { status: 0, message: message.into() }
    }

    /// Whether a later invocation can be expected to succeed without
    /// operator investigation.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Transport { status, .. } => {
                matches!(*status, 0 | 408 | 429) || (500..=599).contains(status)
            }
            Self::Auth(_) | Self::Database(_) => true,
            Self::Validation(_) | Self::NotFound(_) | Self::Config(_) | Self::Internal(_) => false,
        }
    }

    /// Stable label suitable for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Transport { .. } => "transport",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for PDP operations
pub type Result<T> = std::result::Result<T, PdpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_retry_on_server_side_failures_only() {
        assert!(PdpError::network("connection refused").is_retriable());
        assert!(PdpError::Transport { status: 503, message: String::new() }.is_retriable());
        assert!(PdpError::Transport { status: 429, message: String::new() }.is_retriable());
        assert!(!PdpError::Transport { status: 404, message: String::new() }.is_retriable());
    }

    #[test]
    fn validation_and_not_found_need_investigation() {
        assert!(!PdpError::Validation("missing ProcessConditionCode".into()).is_retriable());
        assert!(!PdpError::NotFound("invoice F-1".into()).is_retriable());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(PdpError::NotFound("F-1".into())).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["detail"], "F-1");
    }
}
