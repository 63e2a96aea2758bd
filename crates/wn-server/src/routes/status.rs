//! System status and connection tests.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use wn_protocol::secret;
use wn_wapi::{WapiClient, WapiConfig};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub connected: bool,
    pub message: String,
    pub grid_master: String,
    pub wapi_version: String,
    pub tool_count: usize,
    pub mcp_running: bool,
}

/// GET /api/status: probe the configured grid master.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let settings = state.snapshot().await;

    let (connected, message) = match WapiClient::new(&settings.wapi) {
        Ok(client) => {
            let probe = client.test_connection().await;
            (probe.connected, probe.message)
        }
        Err(e) => (false, e.to_string()),
    };

    Json(StatusResponse {
        connected,
        message,
        grid_master: settings.wapi.grid_master,
        wapi_version: settings.wapi.wapi_version,
        tool_count: state.registry.read().await.len(),
        mcp_running: state.worker.status().await.running,
    })
}

/// Body of `POST /api/test-connection`.
#[derive(Debug, Deserialize)]
pub struct TestConnectionRequest {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub wapi_version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/test-connection: probe credentials without saving them.
pub async fn test_connection(
    State(state): State<AppState>,
    body: Result<Json<TestConnectionRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult<Json<TestConnectionResponse>> {
    let Json(req) = body?;
    let current = state.snapshot().await.wapi;
    let wapi_version = req
        .wapi_version
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| current.wapi_version.clone());

    let config = WapiConfig {
        grid_master: req.ip.trim().to_string(),
        username: req.username,
        password: secret::from_string(req.password),
        wapi_version,
        base_url: None,
        ..current
    };

    let client = match WapiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            return Ok(Json(TestConnectionResponse {
                success: false,
                message: format!("Connection failed: {e}"),
            }));
        }
    };

    let probe = client.test_connection().await;
    tracing::info!(grid_master = %config.grid_master, connected = probe.connected, "connection test");
    Ok(Json(TestConnectionResponse {
        success: probe.connected,
        message: probe.message,
    }))
}
