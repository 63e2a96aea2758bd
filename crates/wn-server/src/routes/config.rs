//! Runtime settings endpoints.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/config: settings with secrets masked.
pub async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(state.settings.read().await.masked())
}

/// POST /api/config: partial update, persisted to the settings file.
pub async fn update_config(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(patch) = body?;
    apply(&state, patch).await
}

/// GET /api/mcp/config: the discovery section only.
pub async fn get_mcp_config(State(state): State<AppState>) -> Json<Value> {
    let settings = state.settings.read().await;
    Json(serde_json::to_value(&settings.mcp).unwrap_or(Value::Null))
}

/// POST /api/mcp/config: partial update of the discovery section.
pub async fn update_mcp_config(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(patch) = body?;
    apply(&state, json!({ "mcp": patch })).await
}

async fn apply(state: &AppState, patch: Value) -> ApiResult<Json<Value>> {
    state.update_settings(patch).await?;
    Ok(Json(json!({ "success": true })))
}
