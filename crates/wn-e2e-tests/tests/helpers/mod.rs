//! Shared test harness for E2E integration tests.
//!
//! Runs the real server router in-process against a wiremock WAPI grid
//! master, with a throwaway schema cache directory per harness.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

use wn_mcp::SchemaCache;
use wn_nlp::{Classification, TextClassifier};
use wn_protocol::{ClassifierTier, secret};
use wn_server::build_router;
use wn_server::config::Settings;
use wn_server::state::AppState;
use wn_wapi::WapiConfig;

/// WAPI path prefix the mock grid serves under.
pub const WAPI_BASE: &str = "/wapi/v2.13.1";

pub const NETWORK_REF: &str = "network/ZG5zLm5ldHdvcmskMTAuMC4wLjAvMjQvMA:10.0.0.0/24/default";

/// Server under test plus the mock grid it talks to.
pub struct TestHarness {
    pub wapi: MockServer,
    pub state: AppState,
    pub router: Router,
    /// Keeps the cache directory alive for the harness lifetime.
    _cache_dir: TempDir,
}

impl TestHarness {
    /// Built-in tools, keyword classifier, WAPI pointed at the mock.
    pub async fn new() -> Self {
        let wapi = MockServer::start().await;
        let cache_dir = tempfile::tempdir().unwrap();
        let state = AppState::in_memory(settings_for(&wapi), cache_dir.path().join("cache"));
        Self::assemble(wapi, state, cache_dir)
    }

    /// Same, with `classifier` in place of the configured cascade.
    pub async fn with_classifier(classifier: Arc<dyn TextClassifier>) -> Self {
        let wapi = MockServer::start().await;
        let cache_dir = tempfile::tempdir().unwrap();
        let state = AppState::with_classifier(
            settings_for(&wapi),
            None,
            SchemaCache::new(cache_dir.path().join("cache")),
            classifier,
        );
        Self::assemble(wapi, state, cache_dir)
    }

    fn assemble(wapi: MockServer, state: AppState, cache_dir: TempDir) -> Self {
        let router = build_router(state.clone());
        Self {
            wapi,
            state,
            router,
            _cache_dir: cache_dir,
        }
    }

    /// POST /api/process with `query`.
    pub async fn process(&self, query: &str) -> (StatusCode, Value) {
        self.post("/api/process", json!({ "query": query })).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    /// Full URL path for a WAPI object or reference.
    pub fn wapi_path(rest: &str) -> String {
        format!("{WAPI_BASE}/{rest}")
    }
}

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        wapi: WapiConfig {
            grid_master: "127.0.0.1".into(),
            username: "admin".into(),
            password: secret::from_string("infoblox".into()),
            base_url: Some(format!("{}{WAPI_BASE}", server.uri())),
            ..WapiConfig::default()
        },
        ..Settings::default()
    }
}

/// Classifier that always answers with one fixed label.
pub struct FixedClassifier {
    pub label: String,
    pub confidence: f64,
}

impl FixedClassifier {
    pub fn new(label: &str, confidence: f64) -> Arc<dyn TextClassifier> {
        Arc::new(Self {
            label: label.into(),
            confidence,
        })
    }
}

#[async_trait]
impl TextClassifier for FixedClassifier {
    async fn classify(&self, _text: &str, _candidates: &[String]) -> Option<Classification> {
        Some(Classification::new(
            self.label.clone(),
            self.confidence,
            ClassifierTier::Llm,
        ))
    }

    fn tier(&self) -> ClassifierTier {
        ClassifierTier::Llm
    }
}
