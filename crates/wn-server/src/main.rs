//! wn-server: natural-language front end for InfoBlox WAPI.
//!
//! Serves the query, configuration and tool-management API, and runs the
//! schema discovery worker in the background when a grid is configured.

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use wn_server::build_router;
use wn_server::config::Settings;
use wn_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wn-server starting");

    let path = Settings::default_path();
    let settings = Settings::load(&path)?;
    let addr = format!("{}:{}", settings.host, settings.port);
    let auto_discovery = settings.mcp.auto_discovery;
    let configured = settings.wapi.is_configured();

    let state = AppState::new(settings, Some(path));
    let worker = state.worker.clone();

    if worker.load_persisted().await {
        tracing::info!("using tools from a previous discovery run");
    }
    if auto_discovery && configured {
        worker.start().await;
    } else if !configured {
        tracing::warn!("InfoBlox not configured; serving built-in tools only");
    }

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    worker.stop().await;
    tracing::info!("wn-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
