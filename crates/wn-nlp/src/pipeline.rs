//! Query pipeline: extract entities, classify, merge.

use std::sync::Arc;

use wn_protocol::{EntitySet, ParsedIntent};

use crate::classify::TextClassifier;
use crate::entities::EntityExtractor;

/// Runs one query through extraction and classification.
pub struct QueryPipeline {
    extractor: EntityExtractor,
    classifier: Arc<dyn TextClassifier>,
}

impl QueryPipeline {
    pub fn new(extractor: EntityExtractor, classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    pub fn extract(&self, text: &str) -> EntitySet {
        self.extractor.extract(text)
    }

    /// Classify `text` against the registered operation names.
    ///
    /// Entities returned by the classifier overwrite extracted ones per key.
    pub async fn process(&self, text: &str, operations: &[String]) -> ParsedIntent {
        let mut entities = self.extractor.extract(text);

        let Some(classification) = self.classifier.classify(text, operations).await else {
            tracing::info!(query = %text, "no intent matched");
            return ParsedIntent::unknown(entities);
        };

        entities.merge(classification.entities);
        tracing::info!(
            intent = %classification.label,
            confidence = classification.confidence,
            tier = ?classification.tier,
            "query classified"
        );

        ParsedIntent {
            intent: classification.label,
            confidence: classification.confidence,
            entities,
            tier: classification.tier,
        }
    }
}
