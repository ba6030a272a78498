//! Typed helpers over the raw flow API

use async_trait::async_trait;
use pdpsync_domain::constants::{FLOW_RESOURCE, FLOW_SEARCH_RESOURCE};
use pdpsync_domain::{
    ApiRequest, CallType, DocType, Flow, FlowSearchQuery, FlowSearchResponse, Result,
};
use uuid::Uuid;

use super::ports::PdpProvider;

/// Search request for `flows/search`, tagged with a fresh `Request-Id`.
pub fn search_request(query: &FlowSearchQuery) -> ApiRequest {
    ApiRequest::post(
        format!("{FLOW_SEARCH_RESOURCE}?Request-Id={}", Uuid::new_v4()),
        query.to_payload(),
    )
}

/// Retrieval request for one representation of a flow.
pub fn flow_request(flow_id: &str, doc_type: DocType) -> ApiRequest {
    let request = ApiRequest::get(format!(
        "{FLOW_RESOURCE}/{}?docType={doc_type}",
        urlencoding::encode(flow_id)
    ));
    match doc_type.accept() {
        Some(accept) => request.header("Accept", accept),
        None => request,
    }
}

/// Flow API operations available on every provider
#[async_trait]
pub trait FlowApi {
    /// Search flows updated after the query bound
    async fn search_flows(
        &self,
        query: &FlowSearchQuery,
        call_type: Option<CallType>,
    ) -> Result<FlowSearchResponse>;

    async fn fetch_flow_metadata(&self, flow_id: &str) -> Result<Flow>;

    /// Raw bytes of a binary representation
    async fn fetch_flow_document(&self, flow_id: &str, doc_type: DocType) -> Result<Vec<u8>>;
}

#[async_trait]
impl<P: PdpProvider + ?Sized> FlowApi for P {
    async fn search_flows(
        &self,
        query: &FlowSearchQuery,
        call_type: Option<CallType>,
    ) -> Result<FlowSearchResponse> {
        let mut request = search_request(query);
        request.call_type = call_type;
        self.call_api(request).await?.json()
    }

    async fn fetch_flow_metadata(&self, flow_id: &str) -> Result<Flow> {
        self.call_api(flow_request(flow_id, DocType::Metadata)).await?.json()
    }

    async fn fetch_flow_document(&self, flow_id: &str, doc_type: DocType) -> Result<Vec<u8>> {
        Ok(self.call_api(flow_request(flow_id, doc_type)).await?.error_for_status()?.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_carries_request_id() {
        let query = FlowSearchQuery { updated_after: chrono::DateTime::UNIX_EPOCH, limit: 5 };
        let request = search_request(&query);
        assert!(request.resource.starts_with("flows/search?Request-Id="));
        assert_eq!(request.payload.unwrap()["limit"], 5);
    }

    #[test]
    fn binary_representations_override_accept() {
        let request = flow_request("f 1/2", DocType::Original);
        assert_eq!(request.resource, "flows/f%201%2F2?docType=Original");
        assert_eq!(
            request.extra_headers.get("Accept").map(String::as_str),
            Some("application/octet-stream")
        );
        assert!(flow_request("f1", DocType::Metadata).extra_headers.is_empty());
    }
}
