//! wn-discover: one-shot WAPI schema discovery.
//!
//! Walks the grid's schema, refreshes the schema cache, and writes the
//! generated tool list to `discovered_tools.json` next to it. The server
//! loads that file at start-up when present.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use wn_mcp::{SchemaCache, SchemaDiscoverer, ToolGenerator, ToolRegistry};
use wn_wapi::{WapiClient, WapiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wn-discover starting");

    let config = WapiConfig::from_env();
    let client = WapiClient::new(&config).context("invalid InfoBlox configuration")?;

    let max_objects = std::env::var("WN_MAX_OBJECTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(wn_mcp::discovery::DEFAULT_MAX_OBJECTS);

    let cache = SchemaCache::new(SchemaCache::default_dir());
    let discoverer = SchemaDiscoverer::new(client, cache.clone()).with_max_objects(max_objects);

    let changed = discoverer.check_for_updates().await;
    if changed.is_some() {
        tracing::info!("schema changed since last run");
    }

    let profiles = discoverer.discover().await;
    if profiles.is_empty() {
        anyhow::bail!("no object schemas discovered from {}", config.base_url());
    }

    let tools = ToolGenerator::new(config.max_results).generate(&profiles);
    cache.save_tools(&tools)?;
    if let Some(hash) = changed {
        discoverer.mark_applied(&hash);
    }

    let registry = ToolRegistry::new(tools);
    for (category, tools) in registry.by_category() {
        tracing::info!(category = %category, tools = tools.len(), "category summary");
    }
    tracing::info!(
        objects = registry.object_count(),
        tools = registry.len(),
        cache_dir = %cache.dir().display(),
        "discovery complete"
    );

    Ok(())
}
