//! Token manager with refresh on expiry
//!
//! Manages the bearer token lifecycle per provider account:
//! - Token retrieval from the token store
//! - Authentication when no token exists
//! - Refresh (or re-authentication) once the token has expired
//! - Single-flight: concurrent callers for one service key share one refresh

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use pdpsync_domain::{PdpError, Result, ServiceKey, TokenSet};
use tracing::{debug, info, instrument, warn};

use super::ports::{TokenEndpoint, TokenStore};
use crate::sync::ports::Clock;

/// Token manager shared by every provider client
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<ServiceKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock, locks: Mutex::new(HashMap::new()) }
    }

    /// Return a usable token for the endpoint's service key.
    ///
    /// Performs at most one authenticate/refresh call, and only when no token
    /// is stored or the stored one has expired.
    ///
    /// # Errors
    /// Returns [`PdpError::Auth`] when the token endpoint fails. Nothing is
    /// persisted in that case and an expired token is removed.
    #[instrument(skip(self, endpoint), fields(service = %endpoint.service_key()))]
    pub async fn ensure_valid_token(&self, endpoint: &dyn TokenEndpoint) -> Result<TokenSet> {
        let key = endpoint.service_key();
        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent caller may have refreshed already.
        match self.store.load(&key).await? {
            Some(token) if !token.is_expired(self.clock.now()) => {
                debug!("Stored token still valid");
                Ok(token)
            }
            Some(expired) => self.refresh(endpoint, expired).await,
            None => self.authenticate(endpoint).await,
        }
    }

    /// Exchange credentials for a new token and persist it.
    pub async fn authenticate(&self, endpoint: &dyn TokenEndpoint) -> Result<TokenSet> {
        let key = endpoint.service_key();
        let grant = endpoint.authenticate().await.map_err(into_auth_error)?;
        let token = TokenSet::from_grant(key, grant, self.clock.now());
        self.store.save(&token).await?;

        info!(service = %token.service_key, expires_at = %token.expires_at, "Authenticated with provider");
        Ok(token)
    }

    async fn refresh(&self, endpoint: &dyn TokenEndpoint, expired: TokenSet) -> Result<TokenSet> {
        let Some(refresh_token) = expired.refresh_token.as_deref() else {
            debug!("No refresh token stored, re-authenticating");
            return self.authenticate(endpoint).await;
        };

        match endpoint.refresh(refresh_token).await {
            Ok(grant) => {
                let token = TokenSet::from_grant(expired.service_key, grant, self.clock.now());
                self.store.save(&token).await?;
                info!(service = %token.service_key, "Refreshed access token");
                Ok(token)
            }
            Err(err) => {
                warn!(service = %expired.service_key, error = %err, "Token refresh failed, discarding stored token");
                self.store.delete(&expired.service_key).await?;
                Err(into_auth_error(err))
            }
        }
    }

    fn lock_for(&self, key: &ServiceKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }
}

fn into_auth_error(err: PdpError) -> PdpError {
    match err {
        PdpError::Auth(_) => err,
        other => PdpError::Auth(other.to_string()),
    }
}
