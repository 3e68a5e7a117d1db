//! Corpus documents and ranked result lists

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A retrievable corpus chunk.
///
/// `id` is the only identity used for deduplication. `score` is transient
/// ranking state and is ignored by equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Document {
    /// Create a document without metadata
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
            score: None,
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set the transient relevance score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable origin of the chunk, if the indexer recorded one
    pub fn source(&self) -> Option<&str> {
        ["file_name", "source", "name"]
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(|v| v.as_str()))
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Document {}

/// Documents ordered by descending score.
///
/// Scores from different retrievers are not comparable; only rank position
/// is meaningful across lists.
pub type RankedDocumentList = Vec<Document>;
