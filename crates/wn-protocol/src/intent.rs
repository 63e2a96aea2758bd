use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attribute values pulled out of one query, keyed by lowercase name.
///
/// Built fresh per query and dropped once the WAPI call returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySet(BTreeMap<String, serde_json::Value>);

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the lowercased key; the last value for a key wins.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.as_ref().to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// String form of a value (numbers are rendered, objects are not).
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Overlay `other` on top of `self`, replacing shared keys.
    pub fn merge(&mut self, other: EntitySet) {
        for (k, v) in other.0 {
            self.insert(k, v);
        }
    }

    /// Build from a JSON object; non-object values yield an empty set.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut set = Self::new();
        if let Some(map) = value.as_object() {
            for (k, v) in map {
                if !v.is_null() {
                    set.insert(k, v.clone());
                }
            }
        }
        set
    }
}

impl FromIterator<(String, serde_json::Value)> for EntitySet {
    fn from_iter<T: IntoIterator<Item = (String, serde_json::Value)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Which classifier tier produced an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierTier {
    /// Keyword and descriptor-name heuristics.
    Keyword,
    /// Hosted zero-shot text classifier.
    ZeroShot,
    /// Hosted LLM escalation.
    Llm,
    /// Nothing matched.
    #[default]
    None,
}

/// Intent plus entities for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedIntent {
    /// Operation descriptor name, or `unknown`.
    pub intent: String,
    /// Classifier confidence (0.0 - 1.0).
    pub confidence: f64,
    #[serde(default)]
    pub entities: EntitySet,
    #[serde(default)]
    pub tier: ClassifierTier,
}

impl ParsedIntent {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown(entities: EntitySet) -> Self {
        Self {
            intent: Self::UNKNOWN.into(),
            confidence: 0.0,
            entities,
            tier: ClassifierTier::None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == Self::UNKNOWN
    }
}

/// Body of `POST /api/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub query: String,
}

/// Reply of `POST /api/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Unique ID for log correlation (UUIDv7 for time-sortability).
    pub id: Uuid,
    pub query: String,
    pub intent: String,
    pub confidence: f64,
    pub tier: ClassifierTier,
    pub entities: EntitySet,
    /// WAPI result, or `{"error": ..}` / `{"message": ..}`.
    pub result: serde_json::Value,
    pub processed_at: DateTime<Utc>,
}

impl ProcessResponse {
    pub fn new(query: impl Into<String>, parsed: ParsedIntent, result: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            query: query.into(),
            intent: parsed.intent,
            confidence: parsed.confidence,
            tier: parsed.tier,
            entities: parsed.entities,
            result,
            processed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_lowercased_and_last_wins() {
        let mut set = EntitySet::new();
        set.insert("IP", "10.0.0.1");
        set.insert("ip", "10.0.0.2");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("ip").as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn entity_set_serializes_as_plain_map() {
        let mut set = EntitySet::new();
        set.insert("network", "10.0.0.0/24");
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({"network": "10.0.0.0/24"})
        );
    }

    #[test]
    fn merge_overrides_shared_keys_only() {
        let mut base = EntitySet::from_json(&json!({"ip": "10.0.0.1", "ttl": "60"}));
        base.merge(EntitySet::from_json(&json!({"ip": "10.0.0.9", "fqdn": "a.example.com"})));
        assert_eq!(base.get_str("ip").as_deref(), Some("10.0.0.9"));
        assert_eq!(base.get_str("ttl").as_deref(), Some("60"));
        assert!(base.contains("fqdn"));
    }

    #[test]
    fn from_json_skips_nulls_and_non_objects() {
        let set = EntitySet::from_json(&json!({"ip": null, "mac": "aa:bb:cc:dd:ee:ff"}));
        assert_eq!(set.len(), 1);
        assert!(EntitySet::from_json(&json!("nope")).is_empty());
    }

    #[test]
    fn get_str_renders_numbers() {
        let set = EntitySet::from_json(&json!({"ttl": 3600}));
        assert_eq!(set.get_str("ttl").as_deref(), Some("3600"));
    }

    #[test]
    fn tier_serialization() {
        assert_eq!(
            serde_json::to_string(&ClassifierTier::ZeroShot).unwrap(),
            r#""zero_shot""#
        );
        assert_eq!(ClassifierTier::default(), ClassifierTier::None);
    }

    #[test]
    fn unknown_intent() {
        let parsed = ParsedIntent::unknown(EntitySet::new());
        assert!(parsed.is_unknown());
        assert_eq!(parsed.confidence, 0.0);
    }
}
