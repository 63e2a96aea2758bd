//! Discovery worker control and the generated tool catalogue.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use wn_mcp::{McpResult, Statistics, WorkerStatus};
use wn_protocol::{EntitySet, OperationDescriptor};
use wn_wapi::ApiExecutor;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/mcp/status
pub async fn status(State(state): State<AppState>) -> Json<WorkerStatus> {
    Json(state.worker.status().await)
}

/// GET /api/mcp/statistics
pub async fn statistics(State(state): State<AppState>) -> Json<Statistics> {
    Json(state.worker.statistics().await)
}

/// POST /api/mcp/start
pub async fn start(State(state): State<AppState>) -> Json<Value> {
    let started = state.worker.start().await;
    Json(json!({ "success": true, "started": started }))
}

/// POST /api/mcp/stop
pub async fn stop(State(state): State<AppState>) -> Json<Value> {
    let stopped = state.worker.stop().await;
    Json(json!({ "success": true, "stopped": stopped }))
}

/// POST /api/mcp/restart
pub async fn restart(State(state): State<AppState>) -> Json<Value> {
    state.worker.restart().await;
    Json(json!({ "success": true }))
}

fn refresh_outcome(outcome: McpResult<usize>) -> Json<Value> {
    match outcome {
        Ok(count) => Json(json!({ "success": true, "tools_count": count })),
        Err(e) => {
            tracing::warn!(error = %e, "tool refresh failed");
            Json(json!({ "success": false, "error": e.to_string() }))
        }
    }
}

/// POST /api/mcp/refresh-schemas: drop cached schemas and rediscover.
pub async fn refresh_schemas(State(state): State<AppState>) -> Json<Value> {
    refresh_outcome(state.worker.refresh_schemas().await)
}

/// POST /api/mcp/refresh-tools: regenerate tools, reusing fresh cached schemas.
pub async fn refresh_tools(State(state): State<AppState>) -> Json<Value> {
    refresh_outcome(state.worker.refresh_now().await)
}

/// POST /api/mcp/clear-cache
pub async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    match state.worker.clear_cache() {
        Ok(removed) => Json(json!({ "success": true, "removed": removed })),
        Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
    }
}

/// GET /api/mcp/tools: tools grouped by category.
pub async fn tools(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry.read().await;
    Json(json!({
        "total": registry.len(),
        "categories": registry.by_category(),
    }))
}

/// GET /api/mcp/tool-schema/{name}
pub async fn tool_schema(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<OperationDescriptor>> {
    state
        .registry
        .read()
        .await
        .lookup(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("tool '{name}' not found")))
}

#[derive(Debug, Deserialize)]
pub struct ExecuteToolRequest {
    pub tool: String,
    #[serde(default)]
    pub parameters: Value,
}

/// POST /api/mcp/execute-tool: run one tool with explicit parameters.
pub async fn execute_tool(
    State(state): State<AppState>,
    body: Result<Json<ExecuteToolRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    let descriptor = state.registry.read().await.lookup(&req.tool).cloned();

    let result = match descriptor {
        None => json!({ "error": format!("Unsupported tool: {}", req.tool) }),
        Some(descriptor) => {
            let entities = EntitySet::from_json(&req.parameters);
            let max_results = state.settings.read().await.wapi.max_results;
            match state.wapi_client().await {
                Ok(client) => {
                    ApiExecutor::new(&client, max_results)
                        .execute(&descriptor, &entities)
                        .await
                }
                Err(e) => json!({ "error": e.to_string() }),
            }
        }
    };

    Ok(Json(json!({
        "tool": req.tool,
        "parameters": req.parameters,
        "result": result,
        "timestamp": Utc::now(),
    })))
}
