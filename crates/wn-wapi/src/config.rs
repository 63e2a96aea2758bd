//! Connection parameters for one InfoBlox grid master.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use wn_protocol::secret;

use crate::error::{WapiError, WapiResult};

/// WAPI connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WapiConfig {
    /// Grid master address (IPv4 or hostname).
    #[serde(default)]
    pub grid_master: String,
    #[serde(default)]
    pub username: String,
    #[serde(default = "secret::empty", with = "wn_protocol::secret")]
    pub password: SecretString,
    /// WAPI version path segment (e.g. "v2.13.1").
    #[serde(default = "default_wapi_version")]
    pub wapi_version: String,
    /// Verify the grid master's TLS certificate. Grid masters usually
    /// ship self-signed certificates, hence off by default.
    #[serde(default)]
    pub ssl_verify: bool,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// `_max_results` sent with searches.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Replaces `https://<grid_master>/wapi/<version>` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_wapi_version() -> String {
    "v2.13.1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_results() -> u32 {
    100
}

impl Default for WapiConfig {
    fn default() -> Self {
        Self {
            grid_master: String::new(),
            username: String::new(),
            password: secret::empty(),
            wapi_version: default_wapi_version(),
            ssl_verify: false,
            timeout_secs: default_timeout_secs(),
            max_results: default_max_results(),
            base_url: None,
        }
    }
}

impl WapiConfig {
    /// Load from `INFOBLOX_*` environment variables.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            grid_master: var("INFOBLOX_GRID_MASTER_IP").unwrap_or_default(),
            username: var("INFOBLOX_USERNAME").unwrap_or_default(),
            password: var("INFOBLOX_PASSWORD")
                .map(secret::from_string)
                .unwrap_or_else(secret::empty),
            wapi_version: var("INFOBLOX_WAPI_VERSION").unwrap_or(defaults.wapi_version),
            ssl_verify: var("INFOBLOX_SSL_VERIFY")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            timeout_secs: var("INFOBLOX_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_results: var("INFOBLOX_MAX_RESULTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_results),
            base_url: var("INFOBLOX_WAPI_URL"),
        }
    }

    /// Base URL every WAPI path is appended to.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}/wapi/{}", self.grid_master, self.wapi_version),
        }
    }

    /// True when address and credentials are all present.
    pub fn is_configured(&self) -> bool {
        self.missing().is_empty()
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.grid_master.is_empty() && self.base_url.is_none() {
            missing.push("grid_master");
        }
        if self.username.is_empty() {
            missing.push("username");
        }
        if !secret::is_set(&self.password) {
            missing.push("password");
        }
        missing
    }

    /// Reject unusable settings before any request is built.
    pub fn validate(&self) -> WapiResult<()> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(WapiError::NotConfigured(missing.join(", ")));
        }
        self.check_address()
    }

    /// Only the address format; an empty address passes.
    pub fn check_address(&self) -> WapiResult<()> {
        if !self.grid_master.is_empty() && !is_valid_address(&self.grid_master) {
            return Err(WapiError::InvalidConfig(format!(
                "invalid grid master address: {}",
                self.grid_master
            )));
        }
        Ok(())
    }
}

/// Dotted-quad IPv4, or a hostname made of letters, digits, `-` and `.`.
fn is_valid_address(addr: &str) -> bool {
    let parts: Vec<&str> = addr.split('.').collect();
    let numeric = parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if numeric {
        return parts.len() == 4 && parts.iter().all(|p| p.parse::<u8>().is_ok());
    }
    addr.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
