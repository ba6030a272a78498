//! PDP API client against a mock HTTP server with a real SQLite audit log.

mod support;

use std::net::TcpListener;
use std::sync::Arc;

use pdpsync_core::{CallRepository, FlowApi, PdpProvider, TokenManager, TokenStore};
use pdpsync_domain::{
    ApiRequest, CallType, FlowSearchQuery, PdpError, ProviderConfig, ServiceKey, TokenSet,
};
use pdpsync_infra::database::{SqliteCallRepository, SqliteTokenStore};
use pdpsync_infra::PdpApiClient;
use serde_json::json;
use support::{at, base_time, FixedClock, TestDatabase};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        name: "superpdp".into(),
        environment: "prod".into(),
        tenant: "acme".into(),
        entity: "main".into(),
        base_url: base_url.to_string(),
        username: "erp".into(),
        password: "s3cret".into(),
        api_key: "key-1".into(),
        api_key_header: "x-api-key".into(),
        refresh_route: None,
        discovery_page_size: 10,
        timeout_seconds: 5,
    }
}

struct Fixture {
    db: TestDatabase,
    store: Arc<SqliteTokenStore>,
    calls: Arc<SqliteCallRepository>,
    client: PdpApiClient,
}

fn fixture(config: ProviderConfig) -> Fixture {
    let db = TestDatabase::new();
    let clock = Arc::new(FixedClock(base_time()));
    let store = Arc::new(SqliteTokenStore::new(db.manager.clone()));
    let calls = Arc::new(SqliteCallRepository::new(db.manager.clone()));
    let tokens = Arc::new(TokenManager::new(store.clone(), clock.clone()));
    let client = PdpApiClient::new(config, tokens, calls.clone(), clock).expect("client");
    Fixture { db, store, calls, client }
}

fn grant(access_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "refresh_token": format!("{access_token}-refresh"),
        "expires_in": 3600
    }))
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test(flavor = "multi_thread")]
async fn authenticates_once_and_sends_bearer_and_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("x-api-key", "key-1"))
        .and(body_json(json!({ "username": "erp", "password": "s3cret" })))
        .respond_with(grant("tok-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/flows/search"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("x-api-key", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 0, "results": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let fx = fixture(provider_config(&server.uri()));
    let query = FlowSearchQuery { updated_after: at(-60), limit: 5 };

    let first = fx.client.search_flows(&query, Some(CallType::Synchronization)).await.unwrap();
    let second = fx.client.search_flows(&query, None).await.unwrap();
    assert_eq!(first.total, 0);
    assert!(second.results.is_empty());

    // Token call and the typed search; the untyped search leaves no row.
    assert_eq!(fx.db.count("pdp_calls"), 2);
    let key = ServiceKey::new("superpdp", "prod", "acme");
    let stored = fx.store.load(&key).await.unwrap().expect("token persisted");
    assert_eq!(stored.access_token, "tok-1");
    assert_eq!(stored.expires_at, at(60));
}

#[tokio::test(flavor = "multi_thread")]
async fn token_calls_are_logged_with_redacted_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/token")).respond_with(grant("tok-1")).mount(&server).await;

    let fx = fixture(provider_config(&server.uri()));
    assert_eq!(fx.client.access_token().await.unwrap(), "tok-1");

    let call = fx.calls.find_call(1).await.unwrap().expect("token call recorded");
    assert_eq!(call.call_type, CallType::Authentication);
    assert_eq!(call.request_body.as_deref(), Some("***"));
    assert_eq!(call.response_body.as_deref(), Some("***"));
    assert!(call.endpoint.ends_with("/token"));
    assert!(call.success);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_success_responses_are_returned_and_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/token")).respond_with(grant("tok-1")).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/flows/f-404"))
        .and(query_param("docType", "Metadata"))
        .respond_with(ResponseTemplate::new(404).set_body_string("flow not found"))
        .mount(&server)
        .await;

    let fx = fixture(provider_config(&server.uri()));
    let response = fx
        .client
        .call_api(ApiRequest::get("flows/f-404?docType=Metadata").logged_as(CallType::Synchronization))
        .await
        .unwrap();

    assert_eq!(response.status_code, 404);
    assert_eq!(response.text(), "flow not found");
    let call = fx.calls.find_call(response.call_id.expect("call id")).await.unwrap().unwrap();
    assert!(!call.success);
    assert_eq!(call.status_code, 404);
    assert_eq!(call.response_body.as_deref(), Some("flow not found"));

    let err = fx.client.fetch_flow_metadata("f-404").await.unwrap_err();
    assert!(matches!(err, PdpError::Transport { status: 404, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_tokens_go_through_the_refresh_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/token")).respond_with(grant("never")).expect(0).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/token/refresh"))
        .and(body_json(json!({ "refresh_token": "r-0" })))
        .respond_with(grant("tok-2"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = provider_config(&server.uri());
    config.refresh_route = Some("token/refresh".into());
    let fx = fixture(config);
    let key = ServiceKey::new("superpdp", "prod", "acme");
    fx.store
        .save(&TokenSet {
            service_key: key.clone(),
            access_token: "tok-0".into(),
            refresh_token: Some("r-0".into()),
            expires_at: at(-1),
        })
        .await
        .unwrap();

    assert_eq!(fx.client.access_token().await.unwrap(), "tok-2");
    assert_eq!(fx.client.access_token().await.unwrap(), "tok-2");

    let call = fx.calls.find_call(1).await.unwrap().expect("refresh call recorded");
    assert_eq!(call.request_body.as_deref(), Some("***"));
    assert_eq!(fx.store.load(&key).await.unwrap().unwrap().refresh_token.as_deref(), Some("tok-2-refresh"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_credentials_surface_as_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let fx = fixture(provider_config(&server.uri()));
    let err = fx.client.call_api(ApiRequest::get("flows/f-1?docType=Metadata")).await.unwrap_err();

    assert!(matches!(err, PdpError::Auth(ref m) if m.contains("bad credentials")));
    assert_eq!(fx.db.count("pdp_tokens"), 0);
    let call = fx.calls.find_call(1).await.unwrap().expect("failed token call recorded");
    assert!(!call.success);
    assert_eq!(call.status_code, 401);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_provider_yields_status_zero() {
    let fx = fixture(provider_config(&closed_port_url()));

    let response = fx
        .client
        .call_api(
            ApiRequest::post("token", json!({ "username": "erp" })).logged_as(CallType::Authentication),
        )
        .await
        .unwrap();

    assert_eq!(response.status_code, 0);
    let failure = response.transport_error.expect("transport detail");
    assert_eq!(failure.code, "connect");

    let call = fx.calls.find_call(response.call_id.unwrap()).await.unwrap().unwrap();
    assert_eq!(call.status_code, 0);
    assert!(call.response_body.unwrap().starts_with("connect: "));
}

#[tokio::test(flavor = "multi_thread")]
async fn health_check_reports_reachability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("x-api-key", "key-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let healthy = fixture(provider_config(&server.uri()));
    assert!(healthy.client.check_health().await.unwrap());

    let down = fixture(provider_config(&closed_port_url()));
    assert!(!down.client.check_health().await.unwrap());
}

#[test]
fn empty_base_url_is_a_config_error() {
    let db = TestDatabase::new();
    let clock = Arc::new(FixedClock(base_time()));
    let tokens = Arc::new(TokenManager::new(
        Arc::new(SqliteTokenStore::new(db.manager.clone())),
        clock.clone(),
    ));
    let calls = Arc::new(SqliteCallRepository::new(db.manager.clone()));

    let err = PdpApiClient::new(provider_config("  "), tokens, calls, clock).unwrap_err();
    assert!(matches!(err, PdpError::Config(_)));
}
