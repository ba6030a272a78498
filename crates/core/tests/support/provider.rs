//! Scripted in-memory PDP provider.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pdpsync_core::PdpProvider;
use pdpsync_domain::{
    ApiRequest, ApiResponse, CallType, DocType, Flow, ProviderConfig, Result as DomainResult,
};
use serde_json::json;

/// In-memory mock for `PdpProvider`.
///
/// Search answers with every registered flow (in registration order, capped
/// by the requested limit); `flows/{id}` serves metadata and documents.
/// Flow ids marked as failing answer HTTP 500 on any retrieval.
pub struct MockProvider {
    config: ProviderConfig,
    flows: Mutex<Vec<Flow>>,
    documents: Mutex<HashMap<(String, &'static str), Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    search_status: Mutex<u16>,
    requests: Mutex<Vec<ApiRequest>>,
    next_call_id: AtomicI64,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        let mut config = ProviderConfig::new(name, "https://pdp.test", "svc", "secret");
        config.entity = "main".to_string();
        config.discovery_page_size = 2;
        Self {
            config,
            flows: Mutex::new(Vec::new()),
            documents: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            search_status: Mutex::new(200),
            requests: Mutex::new(Vec::new()),
            next_call_id: AtomicI64::new(1),
        }
    }

    pub fn with_flow(self, flow: Flow) -> Self {
        self.flows.lock().unwrap().push(flow);
        self
    }

    pub fn with_document(self, flow_id: &str, doc_type: DocType, body: impl Into<Vec<u8>>) -> Self {
        self.documents.lock().unwrap().insert((flow_id.to_string(), doc_type.as_str()), body.into());
        self
    }

    pub fn failing_on(self, flow_id: &str) -> Self {
        self.failing.lock().unwrap().insert(flow_id.to_string());
        self
    }

    pub fn with_search_status(self, status: u16) -> Self {
        *self.search_status.lock().unwrap() = status;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Flow ids whose metadata was requested, in request order.
    pub fn metadata_requests(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.resource.ends_with("docType=Metadata"))
            .filter_map(|r| r.resource.strip_prefix("flows/"))
            .filter_map(|r| r.split('?').next())
            .map(str::to_string)
            .collect()
    }

    pub fn search_requests(&self) -> Vec<ApiRequest> {
        self.requests().into_iter().filter(|r| r.resource.starts_with("flows/search")).collect()
    }

    fn respond(&self, status_code: u16, body: Vec<u8>, call_type: Option<CallType>) -> ApiResponse {
        let call_id = call_type.map(|_| self.next_call_id.fetch_add(1, Ordering::SeqCst));
        ApiResponse { status_code, body, call_id, transport_error: None }
    }

    fn search(&self, request: &ApiRequest) -> ApiResponse {
        let status = *self.search_status.lock().unwrap();
        if status != 200 {
            return self.respond(status, b"search unavailable".to_vec(), request.call_type);
        }
        let limit = request
            .payload
            .as_ref()
            .and_then(|p| p["limit"].as_u64())
            .unwrap_or(u64::MAX) as usize;
        let flows = self.flows.lock().unwrap().clone();
        let body = json!({
            "total": flows.len(),
            "results": flows.into_iter().take(limit).collect::<Vec<_>>(),
        });
        self.respond(200, body.to_string().into_bytes(), request.call_type)
    }

    fn retrieve(&self, request: &ApiRequest) -> ApiResponse {
        let path = request.resource.trim_start_matches("flows/");
        let (flow_id, query) = path.split_once('?').unwrap_or((path, ""));
        let doc_type = query.trim_start_matches("docType=");

        if self.failing.lock().unwrap().contains(flow_id) {
            return self.respond(500, b"internal error".to_vec(), request.call_type);
        }
        if doc_type == DocType::Metadata.as_str() {
            let flows = self.flows.lock().unwrap();
            return match flows.iter().find(|f| f.flow_id == flow_id) {
                Some(flow) => {
                    self.respond(200, serde_json::to_vec(flow).unwrap(), request.call_type)
                }
                None => self.respond(404, b"unknown flow".to_vec(), request.call_type),
            };
        }
        match self.documents.lock().unwrap().get(&(flow_id.to_string(), doc_type_key(doc_type))) {
            Some(body) => self.respond(200, body.clone(), request.call_type),
            None => self.respond(404, b"no such representation".to_vec(), request.call_type),
        }
    }
}

fn doc_type_key(raw: &str) -> &'static str {
    [DocType::Metadata, DocType::Original, DocType::Converted, DocType::ReadableView]
        .into_iter()
        .map(|d| d.as_str())
        .find(|d| *d == raw)
        .unwrap_or("")
}

#[async_trait]
impl PdpProvider for MockProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn access_token(&self) -> DomainResult<String> {
        Ok("test-token".to_string())
    }

    async fn check_health(&self) -> DomainResult<bool> {
        Ok(true)
    }

    async fn call_api(&self, request: ApiRequest) -> DomainResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        // Behave like a real network call: give other tasks a chance to run.
        tokio::task::yield_now().await;
        if request.resource.starts_with("flows/search") {
            Ok(self.search(&request))
        } else {
            Ok(self.retrieve(&request))
        }
    }
}
