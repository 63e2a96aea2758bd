//! Shared application state for the Axum server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use wn_mcp::{DiscoveryWorker, SchemaCache, SharedRegistry, ToolRegistry, WorkerOptions};
use wn_nlp::classify::{KeywordClassifier, LlmClassifier, TieredClassifier, ZeroShotClassifier};
use wn_nlp::{EntityExtractor, QueryPipeline, TextClassifier};
use wn_wapi::{WapiClient, WapiResult};

use crate::config::Settings;
use crate::error::{ApiError, ApiResult};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Live settings; handlers take a snapshot per request.
    pub settings: Arc<RwLock<Settings>>,
    /// Where settings updates are written. None keeps them in memory.
    pub settings_path: Option<PathBuf>,
    pub registry: SharedRegistry,
    /// Swapped whenever classifier settings change.
    pub pipeline: Arc<RwLock<Arc<QueryPipeline>>>,
    pub worker: DiscoveryWorker,
}

impl AppState {
    /// State with a classifier built from `settings`.
    pub fn new(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        let cache = SchemaCache::new(
            settings
                .mcp
                .cache_dir
                .clone()
                .unwrap_or_else(SchemaCache::default_dir),
        );
        let classifier = build_classifier(&settings);
        Self::with_classifier(settings, settings_path, cache, classifier)
    }

    /// In-memory state (for tests): no settings file, cache under `cache_dir`.
    pub fn in_memory(settings: Settings, cache_dir: impl Into<PathBuf>) -> Self {
        let classifier = build_classifier(&settings);
        Self::with_classifier(settings, None, SchemaCache::new(cache_dir), classifier)
    }

    pub fn with_classifier(
        settings: Settings,
        settings_path: Option<PathBuf>,
        cache: SchemaCache,
        classifier: Arc<dyn TextClassifier>,
    ) -> Self {
        let registry = ToolRegistry::with_defaults().shared();
        let worker = DiscoveryWorker::new(
            settings.wapi.clone(),
            cache,
            Arc::clone(&registry),
            worker_options(&settings),
        );
        let pipeline = QueryPipeline::new(EntityExtractor::new(), classifier);

        Self {
            settings: Arc::new(RwLock::new(settings)),
            settings_path,
            registry,
            pipeline: Arc::new(RwLock::new(Arc::new(pipeline))),
            worker,
        }
    }

    pub async fn snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub async fn pipeline(&self) -> Arc<QueryPipeline> {
        Arc::clone(&*self.pipeline.read().await)
    }

    /// Client for the currently configured grid master.
    pub async fn wapi_client(&self) -> WapiResult<WapiClient> {
        WapiClient::new(&self.settings.read().await.wapi)
    }

    /// Apply a partial update, persist it, and push it to the components
    /// that hold their own copy.
    pub async fn update_settings(&self, patch: Value) -> ApiResult<()> {
        let mut settings = self.settings.write().await;
        let updated = settings
            .patched(patch)
            .map_err(|e| ApiError::BadRequest(format!("{e:#}")))?;

        if let Some(path) = &self.settings_path {
            updated
                .save(path)
                .map_err(|e| ApiError::Internal(format!("{e:#}")))?;
        }

        self.worker.set_wapi_config(updated.wapi.clone()).await;
        if classifier_changed(&settings, &updated) {
            let pipeline = QueryPipeline::new(EntityExtractor::new(), build_classifier(&updated));
            *self.pipeline.write().await = Arc::new(pipeline);
            tracing::info!("classifier rebuilt from new settings");
        }

        *settings = updated;
        Ok(())
    }
}

fn worker_options(settings: &Settings) -> WorkerOptions {
    WorkerOptions {
        refresh_interval: Duration::from_secs(settings.mcp.refresh_interval_secs),
        max_objects: settings.mcp.max_objects,
        max_results: settings.wapi.max_results,
    }
}

fn classifier_changed(old: &Settings, new: &Settings) -> bool {
    let view = |s: &Settings| {
        serde_json::json!({
            "llm": s.llm,
            "zero_shot": s.zero_shot,
            "threshold": s.classifier_threshold,
        })
    };
    view(old) != view(new)
}

/// Keyword tier always; zero-shot and LLM tiers when configured.
pub fn build_classifier(settings: &Settings) -> Arc<dyn TextClassifier> {
    let mut tiered = TieredClassifier::new(Box::new(KeywordClassifier::new()))
        .with_threshold(settings.classifier_threshold);

    if settings.zero_shot.is_enabled() {
        match ZeroShotClassifier::new(settings.zero_shot.clone()) {
            Ok(classifier) => {
                tracing::info!(url = %settings.zero_shot.url, "zero-shot tier enabled");
                tiered = tiered.with_zero_shot(Box::new(classifier));
            }
            Err(e) => tracing::warn!(error = %e, "zero-shot tier disabled"),
        }
    }

    if settings.llm.is_enabled() {
        match LlmClassifier::new(settings.llm.clone()) {
            Ok(classifier) => {
                tracing::info!(model = %settings.llm.model, "LLM tier enabled");
                tiered = tiered.with_llm(Box::new(classifier));
            }
            Err(e) => tracing::warn!(error = %e, "LLM tier disabled"),
        }
    }

    Arc::new(tiered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn update_is_persisted_to_settings_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wapi-nlp.toml");
        let state = AppState::with_classifier(
            Settings::default(),
            Some(path.clone()),
            SchemaCache::new(tmp.path().join("cache")),
            build_classifier(&Settings::default()),
        );

        state
            .update_settings(json!({"wapi": {"grid_master": "10.10.0.1"}}))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("10.10.0.1"));
        assert_eq!(state.snapshot().await.wapi.grid_master, "10.10.0.1");
    }

    #[tokio::test]
    async fn rejected_update_keeps_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::in_memory(Settings::default(), tmp.path().join("cache"));

        let err = state
            .update_settings(json!({"classifier_threshold": -1}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(state.snapshot().await.classifier_threshold, 0.8);
    }

    #[tokio::test]
    async fn pipeline_swapped_only_for_classifier_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::in_memory(Settings::default(), tmp.path().join("cache"));
        let before = state.pipeline().await;

        state.update_settings(json!({"execution_threshold": 0.6})).await.unwrap();
        assert!(Arc::ptr_eq(&before, &state.pipeline().await));

        state.update_settings(json!({"classifier_threshold": 0.7})).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &state.pipeline().await));
    }
}
