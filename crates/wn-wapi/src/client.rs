//! HTTP client for one WAPI grid master.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use wn_protocol::{ObjectSchema, SchemaIndex};

use crate::config::WapiConfig;
use crate::error::{WapiError, WapiResult};

/// Outcome of a connection test.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

/// Authenticated WAPI client.
///
/// Every call is a single request; no retry, no backoff.
#[derive(Debug, Clone)]
pub struct WapiClient {
    http: reqwest::Client,
    base_url: String,
    grid_master: String,
    username: String,
    password: SecretString,
}

impl WapiClient {
    /// Build a client from validated settings.
    pub fn new(config: &WapiConfig) -> WapiResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("wapi-nlp/", env!("CARGO_PKG_VERSION")));
        if !config.ssl_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| WapiError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            grid_master: config.grid_master.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn grid_master(&self) -> &str {
        &self.grid_master
    }

    /// `path` is relative to the base URL and may carry its own query string.
    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() || path.starts_with('?') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.username, Some(self.password.expose_secret()))
    }

    pub async fn get(&self, path: &str, query: &[(String, String)]) -> WapiResult<Value> {
        let mut req = self.authed(self.http.get(self.url(path)));
        if !query.is_empty() {
            req = req.query(query);
        }
        self.send(req).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> WapiResult<Value> {
        let req = self.authed(self.http.post(self.url(path))).json(body);
        self.send(req).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> WapiResult<Value> {
        let req = self.authed(self.http.put(self.url(path))).json(body);
        self.send(req).await
    }

    pub async fn delete(&self, path: &str) -> WapiResult<Value> {
        let req = self.authed(self.http.delete(self.url(path)));
        self.send(req).await
    }

    async fn send(&self, req: RequestBuilder) -> WapiResult<Value> {
        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "WAPI returned an error status");
            return Err(WapiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        // WAPI answers create/update/delete with a bare JSON string (the _ref).
        serde_json::from_str(&body).map_err(|e| WapiError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> WapiError {
        if err.is_connect() {
            WapiError::Connect {
                grid_master: self.grid_master.clone(),
            }
        } else {
            WapiError::Transport(err)
        }
    }

    // ── Schema ──────────────────────────────────────────────────

    /// Raw schema index document, used for change detection.
    pub async fn schema_index_raw(&self) -> WapiResult<Value> {
        self.get("?_schema", &[]).await
    }

    pub async fn schema_index(&self) -> WapiResult<SchemaIndex> {
        let raw = self.schema_index_raw().await?;
        serde_json::from_value(raw).map_err(|e| WapiError::Decode(e.to_string()))
    }

    pub async fn object_schema(&self, object: &str) -> WapiResult<ObjectSchema> {
        let raw = self
            .get(&format!("{object}?_schema&_schema_version=2"), &[])
            .await?;
        serde_json::from_value(raw).map_err(|e| WapiError::Decode(e.to_string()))
    }

    // ── Connectivity ────────────────────────────────────────────

    /// Probe the grid with a schema request.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let req = self.authed(self.http.get(self.url("?_schema")));
        match req.send().await {
            Ok(resp) if resp.status().is_success() => ConnectionStatus {
                connected: true,
                message: "Connected successfully".into(),
            },
            Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED => ConnectionStatus {
                connected: false,
                message: "Authentication failed - check credentials".into(),
            },
            Ok(resp) => ConnectionStatus {
                connected: false,
                message: format!("Connection failed: HTTP {}", resp.status().as_u16()),
            },
            Err(e) => {
                tracing::warn!(grid_master = %self.grid_master, error = %e, "WAPI connection test failed");
                ConnectionStatus {
                    connected: false,
                    message: self.transport_error(e).to_string(),
                }
            }
        }
    }
}
