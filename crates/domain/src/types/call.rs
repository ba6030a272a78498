//! Outbound PDP calls and their audit trail

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{PdpError, Result};
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
    Get,
    Post,
    Head,
}

impl_domain_status_conversions!(ApiMethod {
    Get => "get",
    Post => "post",
    Head => "head",
});

impl ApiMethod {
    pub fn as_http(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Head => "HEAD",
        }
    }
}

/// Audit category of a call. Calls without a type are not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallType {
    Authentication,
    Synchronization,
}

impl_domain_status_conversions!(CallType {
    Authentication => "authentication",
    Synchronization => "synchronization",
});

/// One logical request against a provider resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Path relative to the provider base URL, query string included.
    pub resource: String,
    pub method: ApiMethod,
    pub payload: Option<serde_json::Value>,
    pub extra_headers: BTreeMap<String, String>,
    pub call_type: Option<CallType>,
}

impl ApiRequest {
    pub fn get(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            method: ApiMethod::Get,
            payload: None,
            extra_headers: BTreeMap::new(),
            call_type: None,
        }
    }

    pub fn post(resource: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            resource: resource.into(),
            method: ApiMethod::Post,
            payload: Some(payload),
            extra_headers: BTreeMap::new(),
            call_type: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn logged_as(mut self, call_type: CallType) -> Self {
        self.call_type = Some(call_type);
        self
    }
}

/// Provider-specific detail attached when no HTTP answer was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFailure {
    pub code: String,
    pub message: String,
}

impl From<TransportFailure> for PdpError {
    fn from(value: TransportFailure) -> Self {
        PdpError::network(format!("{}: {}", value.code, value.message))
    }
}

/// Outcome of a call. HTTP failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// `0` when the request never produced an HTTP answer.
    pub status_code: u16,
    pub body: Vec<u8>,
    /// Audit row written for this call, when it carried a [`CallType`].
    pub call_id: Option<i64>,
    pub transport_error: Option<TransportFailure>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a failed call into a [`PdpError::Transport`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = match &self.transport_error {
            Some(failure) => format!("{}: {}", failure.code, failure.message),
            None => self.text(),
        };
        Err(PdpError::Transport { status: self.status_code, message })
    }

    /// Decode a successful JSON body.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.error_for_status()?;
        serde_json::from_slice(&response.body)
            .map_err(|e| PdpError::Validation(format!("unexpected provider payload: {e}")))
    }
}

/// Immutable audit row of an externally typed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCall {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub call_type: CallType,
    pub method: ApiMethod,
    pub endpoint: String,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub provider: String,
    pub tenant: String,
    pub status_code: u16,
    pub success: bool,
    /// Processing summary written back by the sync engine.
    pub summary: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
