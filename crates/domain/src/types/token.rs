//! OAuth bearer tokens issued by a PDP provider

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identity a token is issued for: one row per key in the token store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceKey {
    pub provider: String,
    pub environment: String,
    pub tenant: String,
}

impl ServiceKey {
    pub fn new(
        provider: impl Into<String>,
        environment: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self { provider: provider.into(), environment: environment.into(), tenant: tenant.into() }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.provider, self.environment, self.tenant)
    }
}

/// Stored bearer token for a [`ServiceKey`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub service_key: ServiceKey,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Build a token from an endpoint answer received at `now`.
    #[must_use]
    pub fn from_grant(service_key: ServiceKey, grant: TokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            service_key,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: now + Duration::seconds(grant.expires_in.max(0)),
        }
    }

    /// A token is unusable from its expiry instant onwards.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// Tokens never reach logs through Debug.
impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("service_key", &self.service_key)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant").field("expires_in", &self.expires_in).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(expires_in: i64) -> TokenGrant {
        TokenGrant {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            expires_in,
        }
    }

    #[test]
    fn expires_exactly_at_deadline() {
        let now = Utc::now();
        let token = TokenSet::from_grant(ServiceKey::new("acme", "prod", "t1"), grant(60), now);

        assert!(!token.is_expired(now + Duration::seconds(59)));
        assert!(token.is_expired(now + Duration::seconds(60)));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let token =
            TokenSet::from_grant(ServiceKey::new("acme", "prod", "t1"), grant(60), Utc::now());
        let rendered = format!("{token:?} {:?}", grant(60));
        assert!(!rendered.contains("\"at\""));
        assert!(!rendered.contains("\"rt\""));
        assert!(rendered.contains("acme"));
    }

    #[test]
    fn grant_without_refresh_token_parses() {
        let grant: TokenGrant =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3600}"#).unwrap();
        assert_eq!(grant.refresh_token, None);
        assert_eq!(grant.expires_in, 3600);
    }
}
