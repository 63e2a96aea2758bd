//! API route definitions and router builder.

pub mod config;
pub mod health;
pub mod mcp;
pub mod process;
pub mod status;
pub mod suggestions;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mcp = Router::new()
        .route("/status", get(mcp::status))
        .route("/statistics", get(mcp::statistics))
        .route("/start", post(mcp::start))
        .route("/stop", post(mcp::stop))
        .route("/restart", post(mcp::restart))
        .route("/refresh-schemas", post(mcp::refresh_schemas))
        .route("/refresh-tools", post(mcp::refresh_tools))
        .route("/clear-cache", post(mcp::clear_cache))
        .route(
            "/config",
            get(config::get_mcp_config).post(config::update_mcp_config),
        )
        .route("/tools", get(mcp::tools))
        .route("/tool-schema/{name}", get(mcp::tool_schema))
        .route("/execute-tool", post(mcp::execute_tool));

    let api = Router::new()
        .route("/status", get(status::status))
        .route("/process", post(process::process))
        .route("/suggestions", get(suggestions::suggestions))
        .route("/config", get(config::get_config).post(config::update_config))
        .route("/test-connection", post(status::test_connection))
        .nest("/mcp", mcp);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
