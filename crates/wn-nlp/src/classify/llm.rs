//! LLM classifier over an OpenAI-compatible chat completions API.
//!
//! Last tier: asked only when the cheaper tiers are unsure. The model is
//! given the candidate operation names and must answer with a JSON object
//! `{"intent": "<name>", "entities": {..}}`. Its answer is trusted at a
//! fixed confidence.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use wn_protocol::{ClassifierTier, EntitySet, secret};

use super::{Classification, TextClassifier};
use crate::error::{NlpError, NlpResult};

/// Confidence assigned to every accepted LLM answer.
pub const LLM_CONFIDENCE: f64 = 0.9;

/// Configuration for the chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL (`/chat/completions` is appended).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "secret::empty", with = "wn_protocol::secret")]
    pub api_key: SecretString,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "https://api.x.ai/v1".into()
}
fn default_model() -> String {
    "grok-3".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: secret::empty(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// Load from `GROK_API_KEY`, `GROK_API_BASE_URL` and `GROK_MODEL`.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            base_url: var("GROK_API_BASE_URL").unwrap_or_else(default_base_url),
            api_key: var("GROK_API_KEY")
                .map(secret::from_string)
                .unwrap_or_else(secret::empty),
            model: var("GROK_MODEL").unwrap_or_else(default_model),
            ..Self::default()
        }
    }

    /// The tier needs an API key.
    pub fn is_enabled(&self) -> bool {
        secret::is_set(&self.api_key)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Expected JSON shape from the model.
#[derive(Debug, Deserialize)]
struct LlmIntent {
    intent: Option<String>,
    #[serde(default)]
    entities: serde_json::Value,
}

/// Chat-completions classifier.
pub struct LlmClassifier {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClassifier {
    pub fn new(config: LlmConfig) -> NlpResult<Self> {
        if !config.is_enabled() {
            return Err(NlpError::NotConfigured("GROK_API_KEY"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn call(&self, text: &str, candidates: &[String]) -> NlpResult<Option<Classification>> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let system = system_prompt(candidates);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| NlpError::Decode(e.to_string()))?;
        let Some(content) = chat.choices.into_iter().next().map(|c| c.message.content) else {
            return Ok(None);
        };

        let parsed: LlmIntent = serde_json::from_str(extract_json(&content))
            .map_err(|e| NlpError::Decode(format!("{e}, raw: {content}")))?;

        let Some(intent) = parsed.intent.filter(|i| !i.is_empty()) else {
            return Ok(None);
        };
        if !candidates.contains(&intent) {
            tracing::warn!(intent = %intent, "LLM returned an unknown operation");
            return Ok(None);
        }

        Ok(Some(Classification {
            label: intent,
            confidence: LLM_CONFIDENCE,
            entities: EntitySet::from_json(&parsed.entities),
            tier: ClassifierTier::Llm,
        }))
    }
}

#[async_trait]
impl TextClassifier for LlmClassifier {
    async fn classify(&self, text: &str, candidates: &[String]) -> Option<Classification> {
        if candidates.is_empty() {
            return None;
        }
        match self.call(text, candidates).await {
            Ok(Some(result)) => Some(result),
            Ok(None) => {
                tracing::debug!("LLM returned no match");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM classification failed");
                None
            }
        }
    }

    fn tier(&self) -> ClassifierTier {
        ClassifierTier::Llm
    }
}

fn system_prompt(candidates: &[String]) -> String {
    format!(
        r#"You translate InfoBlox DDI requests into WAPI operations.

Available operations:
{}

Entity keys: network (CIDR), ip, mac, fqdn, ttl (integer seconds), comment, extattrs.

Respond with ONLY a JSON object (no markdown, no explanation):
{{"intent": "<operation>", "entities": {{<key>: <value>}}}}

If no operation fits, respond with:
{{"intent": null, "entities": {{}}}}"#,
        candidates.join("\n")
    )
}

/// Extract JSON from LLM output that may be wrapped in markdown code blocks.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}
