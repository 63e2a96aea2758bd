//! Server settings: environment first, then the TOML settings file on top.
//!
//! `POST /api/config` patches the live settings and writes them back to the
//! same file. Secrets are held as `SecretString` and masked on the way out.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wn_nlp::classify::{LlmConfig, ZeroShotConfig};
use wn_wapi::WapiConfig;

/// Replacement text for secrets in `GET /api/config`.
pub const MASK: &str = "***";

const DEFAULT_SETTINGS_FILE: &str = "wapi-nlp.toml";

/// Discovery worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpSettings {
    /// Start the discovery worker at boot when WAPI is configured.
    #[serde(default = "default_true")]
    pub auto_discovery: bool,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
    /// Schema cache directory; `WN_CACHE_DIR` or `~/.infoblox_mcp/cache` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval() -> u64 {
    3600
}

fn default_max_objects() -> usize {
    50
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            auto_discovery: true,
            refresh_interval_secs: default_refresh_interval(),
            max_objects: default_max_objects(),
            cache_dir: None,
        }
    }
}

/// Top-level server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Minimum confidence before a classified query is sent to WAPI.
    #[serde(default = "default_execution_threshold")]
    pub execution_threshold: f64,
    /// Confidence at which the classifier cascade stops escalating.
    #[serde(default = "default_classifier_threshold")]
    pub classifier_threshold: f64,
    #[serde(default)]
    pub wapi: WapiConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub zero_shot: ZeroShotConfig,
    #[serde(default)]
    pub mcp: McpSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_execution_threshold() -> f64 {
    0.5
}

fn default_classifier_threshold() -> f64 {
    wn_nlp::classify::tiered::DEFAULT_THRESHOLD
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            execution_threshold: default_execution_threshold(),
            classifier_threshold: default_classifier_threshold(),
            wapi: WapiConfig::default(),
            llm: LlmConfig::default(),
            zero_shot: ZeroShotConfig::default(),
            mcp: McpSettings::default(),
        }
    }
}

impl Settings {
    /// Settings from environment variables only.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let port = var("WN_PORT")
            .or_else(|| var("INFOBLOX_FLASK_PORT"))
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_port);

        Self {
            host: var("WN_HOST").unwrap_or_else(default_host),
            port,
            wapi: WapiConfig::from_env(),
            llm: LlmConfig::from_env(),
            zero_shot: ZeroShotConfig::from_env(),
            mcp: McpSettings {
                cache_dir: var("WN_CACHE_DIR").map(PathBuf::from),
                ..McpSettings::default()
            },
            ..Self::default()
        }
    }

    /// `WN_SETTINGS_FILE`, else `wapi-nlp.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var("WN_SETTINGS_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }

    /// Environment settings with the file at `path` (if it exists) on top.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let base = Self::from_env();
        if !path.exists() {
            return Ok(base);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let file: toml::Value = toml::from_str(&contents)
            .with_context(|| format!("parsing settings file {}", path.display()))?;

        let mut merged = serde_json::to_value(&base)?;
        merge(&mut merged, serde_json::to_value(file)?);
        let settings: Self = serde_json::from_value(merged)?;
        settings.validate()?;

        tracing::info!(path = %path.display(), "settings file loaded");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("writing settings file {}", path.display()))?;
        tracing::info!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.wapi.check_address()?;
        for (name, value) in [
            ("execution_threshold", self.execution_threshold),
            ("classifier_threshold", self.classifier_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must be between 0 and 1, got {value}");
            }
        }
        Ok(())
    }

    /// Apply a partial JSON update. Keys left out keep their value, and
    /// masked secrets echoed back by a client are ignored.
    pub fn patched(&self, mut patch: Value) -> anyhow::Result<Self> {
        if !patch.is_object() {
            anyhow::bail!("settings update must be a JSON object");
        }
        strip_masked(&mut patch);

        let mut merged = serde_json::to_value(self)?;
        merge(&mut merged, patch);
        let settings: Self = serde_json::from_value(merged).context("invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// JSON view with every secret replaced by [`MASK`] (or "" when unset).
    pub fn masked(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        for (section, key) in [("wapi", "password"), ("llm", "api_key"), ("zero_shot", "api_key")] {
            if let Some(secret) = value.get_mut(section).and_then(|s| s.get_mut(key)) {
                let set = secret.as_str().is_some_and(|s| !s.is_empty());
                *secret = Value::String(if set { MASK.into() } else { String::new() });
            }
        }
        value
    }
}

/// Deep-merge `patch` into `base`; objects merge per key, anything else
/// replaces.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

fn strip_masked(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|_, v| v.as_str() != Some(MASK));
        map.values_mut().for_each(strip_masked);
    }
}
