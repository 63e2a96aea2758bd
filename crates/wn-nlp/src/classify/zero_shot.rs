//! Hosted zero-shot classifier (Hugging Face inference API shape).
//!
//! Sends the query and the candidate operation names, phrased as words
//! ("create record host"), and takes the top-scoring label.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use wn_protocol::{ClassifierTier, secret};

use super::{Classification, TextClassifier};
use crate::error::{NlpError, NlpResult};

/// Configuration for the zero-shot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroShotConfig {
    /// Full inference URL; the tier is disabled when empty.
    #[serde(default)]
    pub url: String,
    #[serde(default = "secret::empty", with = "wn_protocol::secret")]
    pub api_key: SecretString,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ZeroShotConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: secret::empty(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ZeroShotConfig {
    /// Load from `ZERO_SHOT_URL` / `ZERO_SHOT_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("ZERO_SHOT_URL").unwrap_or_default(),
            api_key: std::env::var("ZERO_SHOT_API_KEY")
                .map(secret::from_string)
                .unwrap_or_else(|_| secret::empty()),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters,
}

#[derive(Serialize)]
struct ZeroShotParameters {
    candidate_labels: Vec<String>,
}

/// The endpoint answers either with parallel `labels`/`scores` lists or a
/// list of `{label, score}` pairs, depending on the deployment.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Parallel { labels: Vec<String>, scores: Vec<f64> },
    Wrapped(Vec<ZeroShotResponse>),
    Pairs(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl ZeroShotResponse {
    /// Highest scoring `(label, score)`.
    fn best(self) -> Option<(String, f64)> {
        let pairs: Vec<(String, f64)> = match self {
            Self::Parallel { labels, scores } => labels.into_iter().zip(scores).collect(),
            Self::Wrapped(inner) => return inner.into_iter().next()?.best(),
            Self::Pairs(pairs) => pairs.into_iter().map(|p| (p.label, p.score)).collect(),
        };
        pairs
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Client for the zero-shot endpoint.
pub struct ZeroShotClassifier {
    client: reqwest::Client,
    config: ZeroShotConfig,
}

impl ZeroShotClassifier {
    pub fn new(config: ZeroShotConfig) -> NlpResult<Self> {
        if !config.is_enabled() {
            return Err(NlpError::NotConfigured("ZERO_SHOT_URL"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn call(&self, text: &str, candidates: &[String]) -> NlpResult<Option<Classification>> {
        let body = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: candidates.iter().map(|c| c.replace('_', " ")).collect(),
            },
        };

        let mut request = self.client.post(&self.config.url).json(&body);
        if secret::is_set(&self.config.api_key) {
            request = request.bearer_auth(self.config.api_key.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ZeroShotResponse = response
            .json()
            .await
            .map_err(|e| NlpError::Decode(e.to_string()))?;

        let Some((label, score)) = parsed.best() else {
            return Ok(None);
        };

        // Map the spaced label back to the candidate it came from.
        let Some(candidate) = candidates.iter().find(|c| c.replace('_', " ") == label) else {
            tracing::warn!(label = %label, "zero-shot returned a label outside the candidates");
            return Ok(None);
        };

        Ok(Some(Classification::new(
            candidate.clone(),
            score,
            ClassifierTier::ZeroShot,
        )))
    }
}

#[async_trait]
impl TextClassifier for ZeroShotClassifier {
    async fn classify(&self, text: &str, candidates: &[String]) -> Option<Classification> {
        if candidates.is_empty() {
            return None;
        }
        match self.call(text, candidates).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "zero-shot classification failed");
                None
            }
        }
    }

    fn tier(&self) -> ClassifierTier {
        ClassifierTier::ZeroShot
    }
}
