// Local relevance scorer used when no cross-encoder service is configured
use async_trait::async_trait;
use std::collections::HashSet;

use crate::errors::Result;
use crate::rag::reranking::RelevanceScorer;
use crate::retrieval::normalize;
use crate::types::Document;

/// Characters compared when a query term has no exact match.
/// Catches inflected forms ("отпуска" / "отпуском").
const STEM_PREFIX: usize = 5;

/// Score for a term matched only by prefix
const PARTIAL_MATCH: f64 = 0.5;

/// Term-overlap scorer
#[derive(Debug, Clone, Default)]
pub struct TermOverlapScorer;

impl TermOverlapScorer {
    pub fn new() -> Self {
        Self
    }

    /// Fraction of query terms covered by `content`, slightly damped for
    /// long documents
    pub fn score_one(&self, query_terms: &[String], content: &str) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }

        let normalized = normalize(content);
        let doc_len = normalized.split_whitespace().count();
        let doc_terms: HashSet<&str> = normalized.split_whitespace().collect();
        if doc_terms.is_empty() {
            return 0.0;
        }

        let matched: f64 = query_terms
            .iter()
            .map(|term| {
                if doc_terms.contains(term.as_str()) {
                    1.0
                } else if term.chars().count() > STEM_PREFIX {
                    let prefix: String = term.chars().take(STEM_PREFIX).collect();
                    if doc_terms.iter().any(|t| t.starts_with(&prefix)) {
                        PARTIAL_MATCH
                    } else {
                        0.0
                    }
                } else {
                    0.0
                }
            })
            .sum();

        let coverage = matched / query_terms.len() as f64;
        let damping = 1.0 / (1.0 + (doc_len as f64).ln_1p() / 100.0);
        coverage * damping
    }

    fn query_terms(query: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        normalize(query)
            .split_whitespace()
            .filter(|t| seen.insert(t.to_string()))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl RelevanceScorer for TermOverlapScorer {
    async fn score(&self, query: &str, documents: &[Document]) -> Result<Vec<f64>> {
        let terms = Self::query_terms(query);
        Ok(documents
            .iter()
            .map(|doc| self.score_one(&terms, &doc.content))
            .collect())
    }

    fn name(&self) -> &str {
        "term-overlap"
    }
}
