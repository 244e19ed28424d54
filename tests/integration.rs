//! Integration tests against a mock authorization service.
//!
//! Each test starts its own `wiremock` server standing in for the service, so
//! the suite needs no external process. Request counts are asserted with
//! `expect(n)` (verified when the server drops) or `received_requests()`.

use std::time::Duration;

use serde_json::json;
use tupelo::{Client, ContextualTuple, Error, Permission};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "acme";

fn client(server: &MockServer) -> Client {
    Client::builder(server.uri(), TENANT)
        .token("test-token")
        .build()
        .expect("failed to build client")
}

fn allowed(value: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "allowed": value }))
}

fn status(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": value }))
}

async fn requests_to(server: &MockServer, to: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == to)
        .count()
}

// ── Check ─────────────────────────────────────────────────────

#[tokio::test]
async fn check_sends_mapped_relation_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .and(header("content-type", "application/json"))
        .and(header("x-tenant-id", TENANT))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "user": "alice",
            "relation": "reader",
            "object": "doc1",
            "contextualTuples": []
        })))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).check("alice", "read", "doc1").await);
}

#[tokio::test]
async fn check_passes_unknown_permission_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .and(body_json(json!({
            "user": "alice",
            "relation": "viewer",
            "object": "doc1",
            "contextualTuples": []
        })))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).check("alice", "viewer", "doc1").await);
}

#[tokio::test]
async fn check_sends_contextual_tuples_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .and(body_json(json!({
            "user": "alice",
            "relation": "writer",
            "object": "doc1",
            "contextualTuples": [
                {"user": "alice", "relation": "member", "object": "group:eng"},
                {"subject": "alice", "via": "sso"}
            ]
        })))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;

    let extra: ContextualTuple = [("subject", "alice"), ("via", "sso")].into_iter().collect();
    let result = client(&server)
        .check("alice", Permission::Write, "doc1")
        .contextual_tuples(vec![ContextualTuple::new("alice", "member", "group:eng")])
        .contextual_tuple(extra)
        .await;
    assert!(result);
}

#[tokio::test]
async fn cached_result_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(c.check("alice", "read", "doc1").await);
    assert!(c.check("alice", "read", "doc1").await);
    assert_eq!(c.cached_entries(), 1);
}

#[tokio::test]
async fn cached_denial_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(false))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(!c.check("alice", "read", "doc1").await);
    assert!(!c.check("alice", "read", "doc1").await);
}

#[tokio::test]
async fn clones_share_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(c.check("alice", "read", "doc1").await);

    let other = c.clone();
    let handle = tokio::spawn(async move { other.check("alice", "read", "doc1").await });
    assert!(handle.await.unwrap());
}

#[tokio::test]
async fn expired_entry_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .expect(2)
        .mount(&server)
        .await;

    let c = Client::builder(server.uri(), TENANT)
        .cache_ttl(Duration::from_millis(100))
        .build()
        .unwrap();
    assert!(c.check("alice", "read", "doc1").await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(c.check("alice", "read", "doc1").await);
}

#[tokio::test]
async fn server_error_denies_and_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "allowed": true })))
        .expect(2)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(!c.check("alice", "read", "doc1").await);
    assert!(!c.check("alice", "read", "doc1").await);
    assert_eq!(c.cached_entries(), 0);
}

#[tokio::test]
async fn non_ok_success_status_denies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "allowed": true })))
        .mount(&server)
        .await;

    let err = client(&server)
        .check("alice", "read", "doc1")
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Status { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(202));
}

#[tokio::test]
async fn send_reports_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client(&server)
        .check("alice", "read", "doc1")
        .send()
        .await
        .unwrap_err();
    match &err {
        Error::Status { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn missing_allowed_field_denies_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(!c.check("alice", "read", "doc1").await);
    assert!(!c.check("alice", "read", "doc1").await);
    assert_eq!(c.cached_entries(), 1);
}

#[tokio::test]
async fn undecodable_body_denies_and_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(!c.check("alice", "read", "doc1").await);
    let err = c.check("alice", "read", "doc1").send().await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[tokio::test]
async fn unreachable_service_fails_closed() {
    // Reserve a port, then release it so nothing is listening there.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let c = Client::builder(uri, TENANT)
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    assert!(!c.check("alice", "read", "doc1").await);
    assert!(!c.grant("alice", "read", "doc1").await);
    assert!(!c.revoke("alice", "read", "doc1").await);

    let err = c.try_grant("alice", "read", "doc1").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(c.cached_entries(), 0);
}

#[tokio::test]
async fn lru_eviction_refetches_oldest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .mount(&server)
        .await;

    let c = Client::builder(server.uri(), TENANT)
        .cache_capacity(2)
        .build()
        .unwrap();

    c.check("alice", "read", "doc1").await;
    c.check("alice", "read", "doc2").await;
    c.check("alice", "read", "doc1").await;
    c.check("alice", "read", "doc3").await;
    assert_eq!(requests_to(&server, "/api/auth/check").await, 3);
    assert_eq!(c.cached_entries(), 2);

    // doc2 was least recently used and has been evicted; doc1 survives.
    c.check("alice", "read", "doc1").await;
    assert_eq!(requests_to(&server, "/api/auth/check").await, 3);
    c.check("alice", "read", "doc2").await;
    assert_eq!(requests_to(&server, "/api/auth/check").await, 4);
}

#[tokio::test]
async fn no_token_sends_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .mount(&server)
        .await;

    let c = Client::new(server.uri(), TENANT).unwrap();
    assert!(c.check("alice", "read", "doc1").await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(requests[0].headers.get("x-tenant-id").unwrap(), TENANT);
}

#[tokio::test]
async fn trailing_slash_in_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;

    let c = Client::new(format!("{}/", server.uri()), TENANT).unwrap();
    assert!(c.check("alice", "read", "doc1").await);
}

// ── Grant / Revoke ────────────────────────────────────────────

#[tokio::test]
async fn grant_sends_tuple() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/grant"))
        .and(header("x-tenant-id", TENANT))
        .and(body_json(json!({
            "user": "alice",
            "relation": "writer",
            "object": "doc1"
        })))
        .respond_with(status("success"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).grant("alice", "write", "doc1").await);
}

#[tokio::test]
async fn grant_invalidates_cached_denial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(false))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/grant"))
        .respond_with(status("success"))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(!c.check("alice", "read", "doc1").await);
    assert!(!c.check("alice", "read", "doc1").await);

    assert!(c.grant("alice", "read", "doc1").await);
    assert!(c.check("alice", "read", "doc1").await);
}

#[tokio::test]
async fn grant_only_invalidates_exact_tuple() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(false))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/grant"))
        .respond_with(status("success"))
        .mount(&server)
        .await;

    let c = client(&server);
    c.check("alice", "read", "doc1").await;
    c.check("alice", "write", "doc1").await;
    assert_eq!(c.cached_entries(), 2);

    assert!(c.grant("alice", "read", "doc1").await);
    assert_eq!(c.cached_entries(), 1);

    c.check("alice", "write", "doc1").await;
    assert_eq!(requests_to(&server, "/api/auth/check").await, 2);
}

#[tokio::test]
async fn grant_rejected_keeps_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/grant"))
        .respond_with(status("error"))
        .expect(2)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(c.check("alice", "read", "doc1").await);

    assert!(!c.grant("alice", "read", "doc1").await);
    assert_eq!(c.cached_entries(), 1);
    assert!(c.check("alice", "read", "doc1").await);

    let err = c.try_grant("alice", "read", "doc1").await.unwrap_err();
    match err {
        Error::Rejected { status } => assert_eq!(status.as_deref(), Some("error")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn grant_non_ok_status_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/grant"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "status": "success" })))
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(!c.grant("alice", "read", "doc1").await);
    let err = c.try_grant("alice", "read", "doc1").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(201));
}

#[tokio::test]
async fn revoke_sends_tuple_and_invalidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(true))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check"))
        .respond_with(allowed(false))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/revoke"))
        .and(body_json(json!({
            "user": "alice",
            "relation": "owner",
            "object": "doc1"
        })))
        .respond_with(status("success"))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(c.check("alice", "owner", "doc1").await);
    assert!(c.check("alice", "owner", "doc1").await);

    assert!(c.revoke("alice", Permission::Owner, "doc1").await);
    assert!(!c.check("alice", "owner", "doc1").await);
}

#[tokio::test]
async fn try_revoke_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/revoke"))
        .respond_with(status("success"))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .try_revoke("alice", "admin", "doc1")
        .await
        .expect("revoke failed");
}

#[tokio::test]
async fn revoke_missing_status_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/revoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let err = client(&server)
        .try_revoke("alice", "admin", "doc1")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rejected { status: None }));
}
