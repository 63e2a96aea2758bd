//! Background discovery worker.
//!
//! Runs one discovery at start, then checks the schema hash every
//! `refresh_interval` and regenerates the registry when it changed. The
//! task is controlled from the HTTP API (start, stop, restart) and can be
//! asked for a synchronous refresh at any time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wn_wapi::{WapiClient, WapiConfig};

use crate::cache::SchemaCache;
use crate::discovery::{DEFAULT_MAX_OBJECTS, SchemaDiscoverer};
use crate::error::{McpError, McpResult};
use crate::generator::ToolGenerator;
use crate::registry::SharedRegistry;

/// Tunables for the worker.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub refresh_interval: Duration,
    pub max_objects: usize,
    pub max_results: u32,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(3600),
            max_objects: DEFAULT_MAX_OBJECTS,
            max_results: 100,
        }
    }
}

/// Snapshot reported by `GET /api/mcp/status`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub refresh_interval_secs: u64,
    pub tool_count: usize,
}

/// Counters reported by `GET /api/mcp/statistics`.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_objects: usize,
    pub total_tools: usize,
    pub cached_schemas: usize,
}

#[derive(Default)]
struct RunState {
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
}

impl RunState {
    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

struct Shared {
    wapi: RwLock<WapiConfig>,
    cache: SchemaCache,
    registry: SharedRegistry,
    options: WorkerOptions,
    state: Mutex<RunState>,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
    /// Serializes refreshes so two never interleave their registry writes.
    refresh_lock: Mutex<()>,
}

/// Handle to the discovery worker. Cheap to clone.
#[derive(Clone)]
pub struct DiscoveryWorker {
    shared: Arc<Shared>,
}

impl DiscoveryWorker {
    pub fn new(
        wapi: WapiConfig,
        cache: SchemaCache,
        registry: SharedRegistry,
        options: WorkerOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                wapi: RwLock::new(wapi),
                cache,
                registry,
                options,
                state: Mutex::new(RunState::default()),
                last_refresh: RwLock::new(None),
                refresh_lock: Mutex::new(()),
            }),
        }
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.shared.registry)
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.shared.cache
    }

    /// Used by later refreshes; a running loop picks it up on its next tick.
    pub async fn set_wapi_config(&self, config: WapiConfig) {
        *self.shared.wapi.write().await = config;
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Spawn the background loop. Returns false if it was already running.
    pub async fn start(&self) -> bool {
        let mut state = self.shared.state.lock().await;
        if state.is_running() {
            tracing::debug!("discovery worker already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(self.clone(), cancel.clone()));
        state.cancel = Some(cancel);
        state.handle = Some(handle);
        state.started_at = Some(Utc::now());

        tracing::info!(
            interval_secs = self.shared.options.refresh_interval.as_secs(),
            "discovery worker started"
        );
        true
    }

    /// Cancel the loop and wait for it to exit. Returns false if it was not
    /// running.
    pub async fn stop(&self) -> bool {
        let (cancel, handle, was_running) = {
            let mut state = self.shared.state.lock().await;
            let was_running = state.is_running();
            state.started_at = None;
            (state.cancel.take(), state.handle.take(), was_running)
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "discovery worker ended abnormally");
            }
        }

        if was_running {
            tracing::info!("discovery worker stopped");
        }
        was_running
    }

    pub async fn restart(&self) -> bool {
        self.stop().await;
        self.start().await
    }

    pub async fn status(&self) -> WorkerStatus {
        let (running, started_at) = {
            let state = self.shared.state.lock().await;
            (state.is_running(), state.started_at)
        };
        WorkerStatus {
            running,
            started_at,
            last_refresh: *self.shared.last_refresh.read().await,
            refresh_interval_secs: self.shared.options.refresh_interval.as_secs(),
            tool_count: self.shared.registry.read().await.len(),
        }
    }

    pub async fn statistics(&self) -> Statistics {
        let registry = self.shared.registry.read().await;
        Statistics {
            total_objects: registry.object_count(),
            total_tools: registry.len(),
            cached_schemas: self.shared.cache.schema_count(),
        }
    }

    // ── Refresh ─────────────────────────────────────────────────

    async fn discoverer(&self) -> Option<SchemaDiscoverer> {
        let config = self.shared.wapi.read().await.clone();
        match WapiClient::new(&config) {
            Ok(client) => Some(
                SchemaDiscoverer::new(client, self.shared.cache.clone())
                    .with_max_objects(self.shared.options.max_objects),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "WAPI unavailable for discovery");
                None
            }
        }
    }

    /// Discover, regenerate, and swap the registry. Falls back to every
    /// cached profile when WAPI yields nothing. Returns the new tool count.
    pub async fn refresh_now(&self) -> McpResult<usize> {
        let _guard = self.shared.refresh_lock.lock().await;

        let mut profiles = match self.discoverer().await {
            Some(discoverer) => discoverer.discover().await,
            None => Vec::new(),
        };
        if profiles.is_empty() {
            profiles = self.shared.cache.load_all();
            if !profiles.is_empty() {
                tracing::info!(objects = profiles.len(), "using cached schemas");
            }
        }
        if profiles.is_empty() {
            return Err(McpError::NoSchemas);
        }

        let tools = ToolGenerator::new(self.shared.options.max_results).generate(&profiles);
        let count = tools.len();
        if let Err(e) = self.shared.cache.save_tools(&tools) {
            tracing::warn!(error = %e, "failed to save generated tools");
        }
        self.shared.registry.write().await.replace_all(tools);
        *self.shared.last_refresh.write().await = Some(Utc::now());

        tracing::info!(objects = profiles.len(), tools = count, "tool registry refreshed");
        Ok(count)
    }

    /// Drop cached schemas, then rediscover from WAPI.
    pub async fn refresh_schemas(&self) -> McpResult<usize> {
        self.shared.cache.clear()?;
        self.refresh_now().await
    }

    pub fn clear_cache(&self) -> McpResult<usize> {
        self.shared.cache.clear()
    }

    /// Load the tools saved by a previous run into the registry.
    pub async fn load_persisted(&self) -> bool {
        match self.shared.cache.load_tools() {
            Some(tools) if !tools.is_empty() => {
                tracing::info!(tools = tools.len(), "loaded persisted tools");
                self.shared.registry.write().await.replace_all(tools);
                true
            }
            _ => false,
        }
    }

    /// Refresh when the schema hash changed (or always, with `force`). The
    /// new hash is recorded only after a successful refresh, so a failed one
    /// is retried on the next tick. Returns true when the registry was
    /// replaced.
    pub async fn refresh_if_changed(&self, force: bool) -> bool {
        let changed = match self.discoverer().await {
            Some(discoverer) => discoverer
                .check_for_updates()
                .await
                .map(|hash| (discoverer, hash)),
            None => None,
        };
        if changed.is_none() && !force {
            tracing::debug!("WAPI schema unchanged");
            return false;
        }

        match self.refresh_now().await {
            Ok(_) => {
                if let Some((discoverer, hash)) = changed {
                    discoverer.mark_applied(&hash);
                }
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "tool refresh failed, keeping current tools");
                false
            }
        }
    }
}

async fn run(worker: DiscoveryWorker, cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = worker.refresh_if_changed(true) => {}
    }

    let period = worker.shared.options.refresh_interval.max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    // Skip the first tick (fires immediately).
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                worker.refresh_if_changed(false).await;
            }
        }
    }
}
