//! Second-pass relevance scoring of fused candidates
pub mod cross_encoder;
pub mod scorer;

pub use cross_encoder::HttpCrossEncoder;
pub use scorer::TermOverlapScorer;

use crate::errors::{RagError, Result};
use crate::types::Document;
use async_trait::async_trait;
use std::sync::Arc;

/// Joint (query, document) relevance model
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// One score per document, in input order
    async fn score(&self, query: &str, documents: &[Document]) -> Result<Vec<f64>>;

    fn name(&self) -> &str;
}

/// Reranker over a pluggable scorer
#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn RelevanceScorer>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Reorder `documents` by joint score and keep the top `k`.
    ///
    /// Equal scores keep their fused order. An empty candidate set is
    /// returned as-is without consulting the scorer.
    pub async fn rerank(&self, query: &str, documents: Vec<Document>, k: usize) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Ok(documents);
        }

        let scores = self.scorer.score(query, &documents).await?;
        if scores.len() != documents.len() {
            return Err(RagError::RerankFailure(format!(
                "{} returned {} scores for {} documents",
                self.scorer.name(),
                scores.len(),
                documents.len()
            )));
        }

        let mut ranked: Vec<(Document, f64)> = documents.into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(doc, score)| doc.with_score(score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LengthScorer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RelevanceScorer for LengthScorer {
        async fn score(&self, _query: &str, documents: &[Document]) -> Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(documents.iter().map(|d| d.content.len() as f64).collect())
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    struct ShortScorer;

    #[async_trait]
    impl RelevanceScorer for ShortScorer {
        async fn score(&self, _query: &str, _documents: &[Document]) -> Result<Vec<f64>> {
            Ok(vec![1.0])
        }

        fn name(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_rerank_orders_and_truncates() {
        let reranker = Reranker::new(Arc::new(LengthScorer {
            calls: AtomicUsize::new(0),
        }));
        let docs = vec![
            Document::new("a", "x"),
            Document::new("b", "xxx"),
            Document::new("c", "xx"),
        ];

        let ranked = reranker.rerank("q", docs, 2).await.unwrap();
        let ids: Vec<&str> = ranked.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(ranked[0].score, Some(3.0));
    }

    #[tokio::test]
    async fn test_rerank_ties_keep_input_order() {
        let reranker = Reranker::new(Arc::new(LengthScorer {
            calls: AtomicUsize::new(0),
        }));
        let docs = vec![Document::new("first", "ab"), Document::new("second", "cd")];

        let ranked = reranker.rerank("q", docs, 5).await.unwrap();
        assert_eq!(ranked[0].id(), "first");
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_scorer() {
        let scorer = Arc::new(LengthScorer {
            calls: AtomicUsize::new(0),
        });
        let reranker = Reranker::new(scorer.clone());

        let ranked = reranker.rerank("q", Vec::new(), 5).await.unwrap();
        assert!(ranked.is_empty());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_score_count_mismatch_is_rerank_failure() {
        let reranker = Reranker::new(Arc::new(ShortScorer));
        let docs = vec![Document::new("a", ""), Document::new("b", "")];

        let err = reranker.rerank("q", docs, 5).await.unwrap_err();
        assert!(matches!(err, RagError::RerankFailure(_)));
    }
}
