//! Natural-language query endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};

use wn_protocol::{ParsedIntent, ProcessRequest, ProcessResponse};
use wn_wapi::ApiExecutor;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/process: classify a query and run the matching WAPI call.
pub async fn process(
    State(state): State<AppState>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessResponse>> {
    let Json(req) = body?;
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("No query provided".into()));
    }

    tracing::info!(query = %query, "processing query");

    let names = state.registry.read().await.names();
    let parsed = state.pipeline().await.process(query, &names).await;
    let result = dispatch(&state, &parsed).await;

    Ok(Json(ProcessResponse::new(query, parsed, result)))
}

async fn dispatch(state: &AppState, parsed: &ParsedIntent) -> Value {
    let descriptor = {
        let registry = state.registry.read().await;
        registry.lookup(&parsed.intent).cloned()
    };
    let Some(descriptor) = descriptor else {
        tracing::info!(intent = %parsed.intent, "unsupported intent");
        return json!({ "error": format!("Unsupported intent: {}", parsed.intent) });
    };

    let settings = state.snapshot().await;
    if parsed.confidence < settings.execution_threshold {
        tracing::info!(
            intent = %parsed.intent,
            confidence = parsed.confidence,
            threshold = settings.execution_threshold,
            "confidence below execution threshold"
        );
        return json!({ "message": "Low confidence - no action taken" });
    }

    match state.wapi_client().await {
        Ok(client) => {
            ApiExecutor::new(&client, settings.wapi.max_results)
                .execute(&descriptor, &parsed.entities)
                .await
        }
        Err(e) => json!({ "error": e.to_string() }),
    }
}
