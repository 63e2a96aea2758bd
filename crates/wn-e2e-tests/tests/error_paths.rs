//! E2E tests for error paths and edge cases across crate boundaries.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use helpers::TestHarness;

/// Text with no recognisable operation is reported, not executed.
#[tokio::test]
async fn e2e_unsupported_intent() {
    let h = TestHarness::new().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.wapi)
        .await;

    let (status, json) = h.process("bake a pizza").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["intent"], "unknown");
    assert_eq!(json["confidence"], 0.0);
    assert_eq!(json["result"]["error"], "Unsupported intent: unknown");
}

/// Required fields are checked before any request is sent.
#[tokio::test]
async fn e2e_missing_required_fields() {
    let h = TestHarness::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.wapi)
        .await;

    let (_, json) = h.process("Create an A record api.example.com").await;

    assert_eq!(json["intent"], "create_record_a");
    assert_eq!(json["result"]["error"], "Missing required fields: ipv4addr");
}

/// WAPI error statuses surface with the upstream body, inside a 200 reply.
#[tokio::test]
async fn e2e_upstream_error_is_reported() {
    let h = TestHarness::new().await;
    Mock::given(method("POST"))
        .and(path(TestHarness::wapi_path("network")))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&h.wapi)
        .await;

    let (status, json) = h.process("Create a network with CIDR 10.0.0.0/24").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["error"], "API error: 500 - Internal Server Error");
}

/// A duplicate object is a 400 from WAPI with its own JSON error document.
#[tokio::test]
async fn e2e_duplicate_object_passes_wapi_message_through() {
    let h = TestHarness::new().await;
    let wapi_error = r#"{"Error": "AdmConDataError: None (IBDataConflictError: IB.Data.Conflict:The network 10.0.0.0/24 already exists.)"}"#;
    Mock::given(method("POST"))
        .and(path(TestHarness::wapi_path("network")))
        .respond_with(ResponseTemplate::new(400).set_body_string(wapi_error))
        .mount(&h.wapi)
        .await;

    let (_, json) = h.process("Create a network with CIDR 10.0.0.0/24").await;

    let error = json["result"]["error"].as_str().unwrap();
    assert!(error.starts_with("API error: 400 - "));
    assert!(error.contains("already exists"));
}

/// Rejected credentials come back as a failed connection test, not an HTTP error.
#[tokio::test]
async fn e2e_bad_credentials_on_connection_test() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path(helpers::WAPI_BASE))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.wapi)
        .await;

    let (_, json) = h.get("/api/status").await;

    assert_eq!(json["connected"], false);
    assert_eq!(json["message"], "Authentication failed - check credentials");
}

/// An unreachable grid is named in the error.
#[tokio::test]
async fn e2e_unreachable_grid() {
    let h = TestHarness::new().await;
    let (status, _) = h
        .post(
            "/api/config",
            json!({ "wapi": { "base_url": "http://127.0.0.1:1/wapi/v2.13.1" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = h.process("List all networks").await;

    let error = json["result"]["error"].as_str().unwrap();
    assert!(error.starts_with("Could not connect to Grid Master 127.0.0.1"));
}

/// Empty and malformed bodies are the only 400s on the query endpoint.
#[tokio::test]
async fn e2e_bad_request_bodies() {
    let h = TestHarness::new().await;

    let (status, json) = h.process("").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No query provided");

    let (status, _) = h.post("/api/process", json!({ "text": "list networks" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Settings that fail validation are rejected and leave the old ones in place.
#[tokio::test]
async fn e2e_invalid_settings_rejected() {
    let h = TestHarness::new().await;

    let (status, _) = h
        .post("/api/config", json!({ "wapi": { "grid_master": "not a host!" } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.state.snapshot().await.wapi.grid_master, "127.0.0.1");
}
