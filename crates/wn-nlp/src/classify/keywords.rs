//! Keyword classifier: verb and object-word matching.
//!
//! Handles the bulk of phrasings ("create a network ...", "list host
//! records") with no network round trip. Anything it can't place falls
//! through to the remote tiers.

use std::collections::HashSet;

use async_trait::async_trait;
use wn_protocol::ClassifierTier;

use super::{Classification, TextClassifier};

/// Confidence reported for every keyword hit.
pub const KEYWORD_CONFIDENCE: f64 = 0.9;

/// Operation prefixes and the verbs that select them.
const VERBS: &[(&str, &[&str])] = &[
    ("create", &["create", "add", "new", "make"]),
    ("find", &["find", "list", "show", "get", "search", "display"]),
    ("update", &["update", "modify", "change", "set", "edit"]),
    ("delete", &["delete", "remove", "destroy", "drop"]),
];

const CRUD_PREFIXES: &[&str] = &["create_", "find_", "update_", "delete_"];

/// Pattern-matching classifier for well-formed commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextClassifier for KeywordClassifier {
    async fn classify(&self, text: &str, candidates: &[String]) -> Option<Classification> {
        classify_text(text, candidates)
            .map(|label| Classification::new(label, KEYWORD_CONFIDENCE, ClassifierTier::Keyword))
    }

    fn tier(&self) -> ClassifierTier {
        ClassifierTier::Keyword
    }
}

/// Core matching logic.
fn classify_text(text: &str, candidates: &[String]) -> Option<String> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return None;
    }
    let words: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    // ── Function descriptors ────────────────────────────────────

    // next_available_ip_network: every word must be in the text.
    let function_hit = candidates
        .iter()
        .filter(|c| !CRUD_PREFIXES.iter().any(|p| c.starts_with(p)))
        .filter(|c| c.split('_').all(|w| contains_word(&words, w)))
        .max_by_key(|c| (c.split('_').count(), c.len()));
    if let Some(hit) = function_hit {
        return Some(hit.clone());
    }

    // ── CRUD descriptors ────────────────────────────────────────

    let operation = tokens.iter().find_map(|token| {
        VERBS
            .iter()
            .find(|(_, verbs)| verbs.contains(&token.as_str()))
            .map(|(op, _)| *op)
    })?;

    let prefix = format!("{operation}_");
    candidates
        .iter()
        .filter_map(|c| Some((c, c.strip_prefix(&prefix)?)))
        .filter(|(_, object)| object_mentioned(&words, object))
        .max_by_key(|(_, object)| (object.split('_').count(), object.len()))
        .map(|(c, _)| c.clone())
}

/// All words of an object slug appear in the text. The `record` word may
/// be left out for record types with a descriptive name ("create host ...").
fn object_mentioned(words: &HashSet<&str>, object: &str) -> bool {
    let parts: Vec<&str> = object.split('_').collect();
    if parts.iter().all(|p| contains_word(words, p)) {
        return true;
    }
    match parts.as_slice() {
        ["record", kind] if kind.len() >= 3 => contains_word(words, kind),
        _ => false,
    }
}

/// Exact or plural ("networks", "addresses") match.
fn contains_word(words: &HashSet<&str>, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    words.contains(word)
        || words.contains(format!("{word}s").as_str())
        || words.contains(format!("{word}es").as_str())
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
