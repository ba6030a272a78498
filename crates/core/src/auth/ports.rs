//! Port interfaces for token handling

use async_trait::async_trait;
use pdpsync_domain::{Result, ServiceKey, TokenGrant, TokenSet};

/// Durable token storage, one row per [`ServiceKey`].
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored token, if any
    async fn load(&self, key: &ServiceKey) -> Result<Option<TokenSet>>;

    /// Upsert the token for its service key (last write wins)
    async fn save(&self, token: &TokenSet) -> Result<()>;

    /// Remove the stored token
    async fn delete(&self, key: &ServiceKey) -> Result<()>;
}

/// Provider token endpoint.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Identity the issued tokens belong to
    fn service_key(&self) -> ServiceKey;

    /// Exchange credentials for a new token
    async fn authenticate(&self) -> Result<TokenGrant>;

    /// Obtain a new token from a refresh token.
    ///
    /// Providers without a refresh route re-authenticate.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}
