//! Tiered classifier: keyword first, then zero-shot, then LLM.
//!
//! A result at or above the threshold stops the cascade. The LLM is only
//! asked when the best result so far is still below it, and its answer is
//! taken as-is. A failed tier keeps whatever the earlier tiers produced.

use async_trait::async_trait;
use wn_protocol::ClassifierTier;

use super::{Classification, TextClassifier};

/// Default confidence at which the cascade stops.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Composite classifier over up to three tiers.
pub struct TieredClassifier {
    keyword: Box<dyn TextClassifier>,
    zero_shot: Option<Box<dyn TextClassifier>>,
    llm: Option<Box<dyn TextClassifier>>,
    threshold: f64,
}

impl TieredClassifier {
    pub fn new(keyword: Box<dyn TextClassifier>) -> Self {
        Self {
            keyword,
            zero_shot: None,
            llm: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_zero_shot(mut self, classifier: Box<dyn TextClassifier>) -> Self {
        self.zero_shot = Some(classifier);
        self
    }

    pub fn with_llm(mut self, classifier: Box<dyn TextClassifier>) -> Self {
        self.llm = Some(classifier);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn confident(&self, result: &Option<Classification>) -> bool {
        result
            .as_ref()
            .is_some_and(|c| c.confidence >= self.threshold)
    }
}

/// Keep the more confident of two results.
fn better(current: Option<Classification>, next: Option<Classification>) -> Option<Classification> {
    match (current, next) {
        (Some(a), Some(b)) => Some(if b.confidence > a.confidence { b } else { a }),
        (a, b) => a.or(b),
    }
}

#[async_trait]
impl TextClassifier for TieredClassifier {
    async fn classify(&self, text: &str, candidates: &[String]) -> Option<Classification> {
        let mut best = self.keyword.classify(text, candidates).await;
        if self.confident(&best) {
            return best;
        }

        if let Some(zero_shot) = &self.zero_shot {
            tracing::debug!("keyword tier unsure, asking zero-shot");
            best = better(best, zero_shot.classify(text, candidates).await);
            if self.confident(&best) {
                return best;
            }
        }

        if let Some(llm) = &self.llm {
            tracing::debug!("escalating to LLM");
            if let Some(answer) = llm.classify(text, candidates).await {
                return Some(answer);
            }
            tracing::debug!("LLM gave no answer, keeping earlier result");
        }

        best
    }

    /// Not a tier of its own; each [`Classification`] names the tier that
    /// produced it.
    fn tier(&self) -> ClassifierTier {
        ClassifierTier::None
    }
}
