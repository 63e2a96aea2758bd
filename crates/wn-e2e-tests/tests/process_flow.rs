//! E2E tests for the query → classify → WAPI call lifecycle.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use helpers::{NETWORK_REF, TestHarness};

/// "Create a network" posts exactly the extracted CIDR and returns the new ref.
#[tokio::test]
async fn e2e_create_network() {
    let h = TestHarness::new().await;
    Mock::given(method("POST"))
        .and(path(TestHarness::wapi_path("network")))
        .and(body_json(json!({ "network": "10.0.0.0/24" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(NETWORK_REF))
        .expect(1)
        .mount(&h.wapi)
        .await;

    let (status, json) = h.process("Create a network with CIDR 10.0.0.0/24").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "Create a network with CIDR 10.0.0.0/24");
    assert_eq!(json["intent"], "create_network");
    assert_eq!(json["confidence"], 0.9);
    assert_eq!(json["entities"]["network"], "10.0.0.0/24");
    assert_eq!(json["result"], NETWORK_REF);
    assert!(json["id"].is_string());
}

/// "List all networks" is a plain search capped by `_max_results`.
#[tokio::test]
async fn e2e_find_networks() {
    let h = TestHarness::new().await;
    let networks = json!([
        { "_ref": NETWORK_REF, "network": "10.0.0.0/24", "network_view": "default" },
        { "_ref": "network/ZG5z:10.1.0.0/16/default", "network": "10.1.0.0/16", "network_view": "default" },
    ]);
    Mock::given(method("GET"))
        .and(path(TestHarness::wapi_path("network")))
        .and(query_param("_max_results", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(networks.clone()))
        .expect(1)
        .mount(&h.wapi)
        .await;

    let (status, json) = h.process("List all networks").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["intent"], "find_network");
    assert_eq!(json["result"], networks);
}

/// Search terms in the query become WAPI filters.
#[tokio::test]
async fn e2e_find_host_by_name() {
    let h = TestHarness::new().await;
    let hosts = json!([{ "_ref": "record:host/ZG5z:web01.example.com/default", "name": "web01.example.com" }]);
    Mock::given(method("GET"))
        .and(path(TestHarness::wapi_path("record:host")))
        .and(query_param("name", "web01.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hosts.clone()))
        .mount(&h.wapi)
        .await;

    let (_, json) = h.process("find host record web01.example.com").await;

    assert_eq!(json["intent"], "find_record_host");
    assert_eq!(json["result"], hosts);
}

/// Host records wrap the extracted address in the `ipv4addrs` list.
#[tokio::test]
async fn e2e_create_host_record() {
    let h = TestHarness::new().await;
    Mock::given(method("POST"))
        .and(path(TestHarness::wapi_path("record:host")))
        .and(body_json(json!({
            "name": "web01.example.com",
            "ipv4addrs": [{ "ipv4addr": "192.168.1.50" }],
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json("record:host/ZG5z:web01.example.com/default"),
        )
        .expect(1)
        .mount(&h.wapi)
        .await;

    let (_, json) = h
        .process("Create host record web01.example.com with IP 192.168.1.50")
        .await;

    assert_eq!(json["intent"], "create_record_host");
    assert_eq!(json["result"], "record:host/ZG5z:web01.example.com/default");
}

/// Update looks the network up first, then PUTs only the changed fields.
#[tokio::test]
async fn e2e_update_network_resolves_reference() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path(TestHarness::wapi_path("network")))
        .and(query_param("network", "10.0.0.0/24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "_ref": NETWORK_REF }])))
        .expect(1)
        .mount(&h.wapi)
        .await;
    Mock::given(method("PUT"))
        .and(path(TestHarness::wapi_path(NETWORK_REF)))
        .and(body_json(json!({ "comment": "Production servers" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(NETWORK_REF))
        .expect(1)
        .mount(&h.wapi)
        .await;

    let (_, json) = h
        .process(r#"Update network 10.0.0.0/24 comment "Production servers""#)
        .await;

    assert_eq!(json["intent"], "update_network");
    assert_eq!(json["entities"]["comment"], "Production servers");
    assert_eq!(json["result"], NETWORK_REF);
}

/// Delete resolves the reference and deletes it.
#[tokio::test]
async fn e2e_delete_network() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path(TestHarness::wapi_path("network")))
        .and(query_param("network", "10.0.0.0/24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "_ref": NETWORK_REF }])))
        .mount(&h.wapi)
        .await;
    Mock::given(method("DELETE"))
        .and(path(TestHarness::wapi_path(NETWORK_REF)))
        .respond_with(ResponseTemplate::new(200).set_body_json(NETWORK_REF))
        .expect(1)
        .mount(&h.wapi)
        .await;

    let (_, json) = h.process("Delete network 10.0.0.0/24").await;

    assert_eq!(json["intent"], "delete_network");
    assert_eq!(json["result"], NETWORK_REF);
}

/// An empty lookup stops before anything is deleted.
#[tokio::test]
async fn e2e_delete_missing_network_sends_no_delete() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path(TestHarness::wapi_path("network")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.wapi)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.wapi)
        .await;

    let (status, json) = h.process("Delete network 10.9.9.0/24").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["error"], "Object reference not found");
}

/// The explicit tool endpoint skips classification entirely.
#[tokio::test]
async fn e2e_execute_tool_with_parameters() {
    let h = TestHarness::new().await;
    Mock::given(method("POST"))
        .and(path(TestHarness::wapi_path("record:a")))
        .and(body_json(json!({ "name": "api.example.com", "ipv4addr": "10.0.0.7" })))
        .respond_with(ResponseTemplate::new(201).set_body_json("record:a/ZG5z:api.example.com/default"))
        .expect(1)
        .mount(&h.wapi)
        .await;

    let (status, json) = h
        .post(
            "/api/mcp/execute-tool",
            json!({
                "tool": "create_record_a",
                "parameters": { "name": "api.example.com", "ipv4addr": "10.0.0.7" },
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tool"], "create_record_a");
    assert_eq!(json["result"], "record:a/ZG5z:api.example.com/default");
    assert!(json["timestamp"].is_string());
}

/// Connection test and status both probe the schema endpoint.
#[tokio::test]
async fn e2e_status_reports_connected_grid() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path(helpers::WAPI_BASE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "supported_objects": [] })))
        .mount(&h.wapi)
        .await;

    let (_, json) = h.get("/api/status").await;
    assert_eq!(json["connected"], true);
    assert_eq!(json["message"], "Connected successfully");
    assert_eq!(json["tool_count"], 8);
}
