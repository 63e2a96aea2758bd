//! Intent classification: text + candidate operation names → best name.
//!
//! Three tiers share one trait and are composed by [`TieredClassifier`]:
//! - **Keyword** (local): verb and object-word matching, ~0.9 confidence.
//! - **Zero-shot** (remote): hosted classifier scoring every candidate.
//! - **LLM** (remote): chat completion asked to pick a candidate.

pub mod keywords;
pub mod llm;
pub mod tiered;
pub mod zero_shot;

use async_trait::async_trait;
use wn_protocol::{ClassifierTier, EntitySet};

pub use keywords::KeywordClassifier;
pub use llm::{LlmClassifier, LlmConfig};
pub use tiered::TieredClassifier;
pub use zero_shot::{ZeroShotClassifier, ZeroShotConfig};

/// One classifier answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Winning candidate label.
    pub label: String,
    pub confidence: f64,
    /// Entities the classifier found itself (LLM tier only).
    pub entities: EntitySet,
    pub tier: ClassifierTier,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f64, tier: ClassifierTier) -> Self {
        Self {
            label: label.into(),
            confidence,
            entities: EntitySet::new(),
            tier,
        }
    }
}

/// Trait for classifiers that map text onto one of the candidate labels.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Pick the best label for `text`. Returns None if the classifier has
    /// no answer (including remote failures).
    async fn classify(&self, text: &str, candidates: &[String]) -> Option<Classification>;

    /// Tier this classifier reports (for logging/audit).
    fn tier(&self) -> ClassifierTier;
}
