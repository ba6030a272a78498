//! PDP HTTP client with call logging
//!
//! Every call carries the provider API key header. Every call except the
//! token resources also carries `Authorization: Bearer <token>`, obtained
//! through the shared [`TokenManager`]. Calls with a [`CallType`] leave an
//! audit row whether they succeed or not.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pdpsync_core::{CallRepository, Clock, PdpProvider, ProviderFactory, TokenEndpoint, TokenManager};
use pdpsync_domain::constants::{
    HEALTH_CHECK_TIMEOUT_SECS, HEALTH_RESOURCE, MAX_AUDIT_BODY_BYTES, REDACTED, TOKEN_RESOURCE,
};
use pdpsync_domain::{
    ApiCall, ApiMethod, ApiRequest, ApiResponse, CallType, PdpError, ProviderConfig, Result,
    ServiceKey, TokenGrant, TransportFailure,
};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::http::{transport_failure, HttpClient};

/// HTTP client for one configured PDP provider account
pub struct PdpApiClient {
    config: ProviderConfig,
    http: HttpClient,
    tokens: Arc<TokenManager>,
    calls: Arc<dyn CallRepository>,
    clock: Arc<dyn Clock>,
}

impl PdpApiClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    /// Returns [`PdpError::Config`] when the provider has no base URL.
    pub fn new(
        config: ProviderConfig,
        tokens: Arc<TokenManager>,
        calls: Arc<dyn CallRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(PdpError::Config(format!("provider '{}' has no base_url", config.name)));
        }

        let http = HttpClient::builder().timeout(Duration::from_secs(config.timeout_seconds)).build()?;

        Ok(Self { config, http, tokens, calls, clock })
    }

    /// Registry factory building clients that share the token manager and
    /// call repository.
    pub fn factory(
        tokens: Arc<TokenManager>,
        calls: Arc<dyn CallRepository>,
        clock: Arc<dyn Clock>,
    ) -> ProviderFactory {
        Arc::new(move |config: &ProviderConfig| {
            let client = Self::new(
                config.clone(),
                Arc::clone(&tokens),
                Arc::clone(&calls),
                Arc::clone(&clock),
            )?;
            Ok(Arc::new(client) as Arc<dyn PdpProvider>)
        })
    }

    fn is_token_resource(&self, resource: &str) -> bool {
        let path = resource.split('?').next().unwrap_or_default().trim_matches('/');
        path == TOKEN_RESOURCE
            || self.config.refresh_route.as_deref().is_some_and(|route| route.trim_matches('/') == path)
    }

    /// Send the request once and record it when typed.
    async fn execute(&self, request: ApiRequest, bearer: Option<String>) -> Result<ApiResponse> {
        let url = self.config.endpoint(&request.resource);
        let mut builder = self.http.request(http_method(request.method), &url);

        if !self.config.api_key.is_empty() {
            builder = builder.header(self.config.api_key_header.as_str(), self.config.api_key.as_str());
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let started_at = self.clock.now();
        let mut response = match self.http.send(builder).await {
            Ok(resp) => {
                let status_code = resp.status().as_u16();
                match resp.bytes().await {
                    Ok(body) => ApiResponse {
                        status_code,
                        body: body.to_vec(),
                        call_id: None,
                        transport_error: None,
                    },
                    Err(err) => failed_response(transport_failure(&err)),
                }
            }
            Err(failure) => failed_response(failure),
        };
        let completed_at = self.clock.now();

        if !response.is_success() {
            warn!(
                provider = %self.config.name,
                method = request.method.as_http(),
                resource = %request.resource,
                status = response.status_code,
                transport_error = response.transport_error.as_ref().map(|f| f.code.as_str()),
                "PDP call failed"
            );
        }

        if let Some(call_type) = request.call_type {
            let redact = self.is_token_resource(&request.resource);
            let call = ApiCall {
                id: None,
                call_type,
                method: request.method,
                endpoint: url,
                request_body: request.payload.as_ref().map(|payload| {
                    if redact {
                        REDACTED.to_string()
                    } else {
                        audit_body(payload.to_string().as_bytes())
                    }
                }),
                response_body: Some(match &response.transport_error {
                    Some(failure) => format!("{}: {}", failure.code, failure.message),
                    None if redact => REDACTED.to_string(),
                    None => audit_body(&response.body),
                }),
                provider: self.config.name.clone(),
                tenant: self.config.tenant.clone(),
                status_code: response.status_code,
                success: response.is_success(),
                summary: None,
                started_at,
                completed_at,
            };
            let call_id = self.calls.insert_call(&call).await?;
            debug!(call_id, %call_type, success = call.success, "PDP call recorded");
            response.call_id = Some(call_id);
        }

        Ok(response)
    }

    async fn request_grant(&self, request: ApiRequest) -> Result<TokenGrant> {
        match self.execute(request, None).await?.error_for_status() {
            Ok(response) => response.json(),
            Err(err) => Err(PdpError::Auth(format!("token endpoint failed: {err}"))),
        }
    }
}

#[async_trait]
impl TokenEndpoint for PdpApiClient {
    fn service_key(&self) -> ServiceKey {
        ServiceKey::new(&self.config.name, &self.config.environment, &self.config.tenant)
    }

    async fn authenticate(&self) -> Result<TokenGrant> {
        let request = ApiRequest::post(
            TOKEN_RESOURCE,
            json!({ "username": self.config.username, "password": self.config.password }),
        )
        .logged_as(CallType::Authentication);
        self.request_grant(request).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let Some(route) = self.config.refresh_route.as_deref() else {
            debug!(provider = %self.config.name, "No refresh route, re-authenticating");
            return self.authenticate().await;
        };
        let request = ApiRequest::post(route, json!({ "refresh_token": refresh_token }))
            .logged_as(CallType::Authentication);
        self.request_grant(request).await
    }
}

#[async_trait]
impl PdpProvider for PdpApiClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn access_token(&self) -> Result<String> {
        let token = self.tokens.ensure_valid_token(self).await?;
        Ok(token.access_token)
    }

    async fn check_health(&self) -> Result<bool> {
        let health_client = HttpClient::builder()
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .build()?;

        let mut builder = health_client.request(Method::GET, self.config.endpoint(HEALTH_RESOURCE));
        if !self.config.api_key.is_empty() {
            builder = builder.header(self.config.api_key_header.as_str(), self.config.api_key.as_str());
        }

        match health_client.send(builder).await {
            Ok(response) => Ok(response.status().is_success()),
            Err(failure) => {
                warn!(provider = %self.config.name, code = %failure.code, "PDP health check failed");
                Ok(false)
            }
        }
    }

    #[instrument(
        skip(self, request),
        fields(provider = %self.config.name, method = request.method.as_http(), resource = %request.resource)
    )]
    async fn call_api(&self, request: ApiRequest) -> Result<ApiResponse> {
        let bearer = if self.is_token_resource(&request.resource) {
            None
        } else {
            Some(self.access_token().await?)
        };
        let response = self.execute(request, bearer).await?;
        info!(status = response.status_code, call_id = response.call_id, "PDP call completed");
        Ok(response)
    }
}

impl std::fmt::Debug for PdpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdpApiClient")
            .field("provider", &self.config.name)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

fn http_method(method: ApiMethod) -> Method {
    match method {
        ApiMethod::Get => Method::GET,
        ApiMethod::Post => Method::POST,
        ApiMethod::Head => Method::HEAD,
    }
}

fn failed_response(failure: TransportFailure) -> ApiResponse {
    ApiResponse { status_code: 0, body: Vec::new(), call_id: None, transport_error: Some(failure) }
}

/// Text kept in the audit row: UTF-8 bodies truncated, binary bodies summarized.
fn audit_body(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) if text.len() <= MAX_AUDIT_BODY_BYTES => text.to_string(),
        Ok(text) => {
            let mut end = MAX_AUDIT_BODY_BYTES;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}… ({} bytes)", &text[..end], text.len())
        }
        Err(_) => format!("<{} bytes binary>", body.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_body_truncates_on_char_boundary() {
        let text = "é".repeat(MAX_AUDIT_BODY_BYTES);
        let kept = audit_body(text.as_bytes());
        assert!(kept.ends_with(&format!("({} bytes)", text.len())));
        assert!(kept.len() < text.len());
    }

    #[test]
    fn binary_bodies_are_summarized() {
        assert_eq!(audit_body(&[0xff, 0xfe, 0x00]), "<3 bytes binary>");
    }
}
