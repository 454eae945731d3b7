//! Router-level tests for the administrative API
//!
//! Exercises the real control stack behind the handlers; only the HTTP
//! layer is driven in-process via `oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use relaygate_api::{ApiServer, ApiServerConfig};
use relaygate_control::{
    HookPipeline, PortRangeAuthority, ProxyCoordinator, ProxyRegistry, Session, SessionRegistry,
};
use relaygate_proto::{ClientIdentity, ServerMessage};
use relaygate_stats::MemoryStatsStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tower::ServiceExt;

struct TestRelay {
    router: Router,
    sessions: Arc<SessionRegistry>,
    proxies: Arc<ProxyRegistry>,
}

fn build_relay() -> TestRelay {
    let sessions = Arc::new(SessionRegistry::new());
    let proxies = Arc::new(ProxyRegistry::new());
    let stats = Arc::new(MemoryStatsStore::new());
    let authority = Arc::new(PortRangeAuthority::new("relay.test", 20000..=20100));

    let coordinator = Arc::new(ProxyCoordinator::new(
        sessions.clone(),
        proxies.clone(),
        authority,
        stats,
    ));

    let server = ApiServer::new(
        ApiServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            enable_cors: false,
        },
        coordinator,
        sessions.clone(),
    );

    TestRelay {
        router: server.build_router(),
        sessions,
        proxies,
    }
}

fn connect_session(relay: &TestRelay, key: &str, user: &str) -> mpsc::Receiver<ServerMessage> {
    let identity = ClientIdentity {
        user: user.to_string(),
        run_id: format!("run-{}", key),
        metas: Default::default(),
    };
    let (session, rx) = Session::open(key.to_string(), identity, Arc::new(HookPipeline::new()));
    relay.sessions.register(session).unwrap();
    rx
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_register_proxy_accepted_and_delivered() {
    let relay = build_relay();
    let mut rx = connect_session(&relay, "K1", "");

    let response = relay
        .router
        .clone()
        .oneshot(post_json(
            "/api/proxies",
            json!({"name": "web1", "proxy_type": "tcp", "client_key": "K1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // The outcome arrives on the session channel, not in the response
    let msg = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("delivery within a second")
        .expect("queue open");
    assert!(matches!(
        msg,
        ServerMessage::ProxyRegistered { name, .. } if name == "web1"
    ));
    assert!(relay.proxies.contains("web1"));
}

#[tokio::test]
async fn test_register_proxy_unknown_session_still_accepted() {
    let relay = build_relay();

    let response = relay
        .router
        .clone()
        .oneshot(post_json(
            "/api/proxies",
            json!({"name": "web1", "proxy_type": "tcp", "client_key": "ghost"}),
        ))
        .await
        .unwrap();

    // Fire-and-forget: the transport never learns about the silent drop
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(relay.proxies.count(), 0);
}

#[tokio::test]
async fn test_register_proxy_bad_type_is_400() {
    let relay = build_relay();

    let response = relay
        .router
        .clone()
        .oneshot(post_json(
            "/api/proxies",
            json!({"name": "web1", "proxy_type": "stcp", "client_key": "K1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INVALID_PROXY_REQUEST");
}

#[tokio::test]
async fn test_status_listing_online_and_offline() {
    let relay = build_relay();
    let _rx = connect_session(&relay, "K1", "");

    for name in ["web1", "web2"] {
        let response = relay
            .router
            .clone()
            .oneshot(post_json(
                "/api/proxies",
                json!({"name": name, "proxy_type": "http", "client_key": "K1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    // Submissions are async; give the spawned tasks a moment
    tokio::time::sleep(Duration::from_millis(100)).await;
    relay.proxies.remove("web2");

    let response = relay.router.clone().oneshot(get("/api/proxies/http")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);

    let entries = body["proxies"].as_array().unwrap();
    let entry = |n: &str| {
        entries
            .iter()
            .find(|e| e["name"] == n)
            .unwrap_or_else(|| panic!("missing entry {}", n))
    };
    assert_eq!(entry("web1")["status"], "online");
    assert_eq!(entry("web1")["config"]["type"], "http");
    assert!(entry("web1")["remote_addr"].is_string());
    assert_eq!(entry("web2")["status"], "offline");
    assert!(entry("web2")["config"].is_null());
}

#[tokio::test]
async fn test_status_listing_unknown_type_is_400() {
    let relay = build_relay();

    let response = relay.router.clone().oneshot(get("/api/proxies/carrier-pigeon")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "UNKNOWN_PROXY_TYPE");
}

#[tokio::test]
async fn test_status_listing_empty_type_is_ok() {
    let relay = build_relay();

    let response = relay.router.clone().oneshot(get("/api/proxies/udp")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["proxies"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_clients_and_health() {
    let relay = build_relay();
    let _rx = connect_session(&relay, "K1", "alice");

    let response = relay.router.clone().oneshot(get("/api/clients")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["sessions"][0]["user"], "alice");

    let response = relay.router.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_sessions"], 1);
}
