//! Port interfaces for PDP providers and the call audit trail

use async_trait::async_trait;
use pdpsync_domain::{ApiCall, ApiRequest, ApiResponse, ProviderConfig, Result};

/// One configured PDP provider account.
#[async_trait]
pub trait PdpProvider: Send + Sync {
    /// Registry name of the provider
    fn name(&self) -> &str;

    fn config(&self) -> &ProviderConfig;

    /// Valid bearer token, authenticating or refreshing when needed
    async fn access_token(&self) -> Result<String>;

    /// Whether the provider answers on its health resource.
    /// Transport failures yield `Ok(false)`.
    async fn check_health(&self) -> Result<bool>;

    /// Authenticated call. HTTP and transport failures are reported in the
    /// response; `Err` is reserved for authentication and audit failures.
    async fn call_api(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Persistence of the call audit trail
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Insert an audit row and return its id
    async fn insert_call(&self, call: &ApiCall) -> Result<i64>;

    /// Attach the processing summary of a sync run to its anchor call
    async fn record_summary(&self, call_id: i64, summary: &str) -> Result<()>;

    async fn find_call(&self, call_id: i64) -> Result<Option<ApiCall>>;
}
