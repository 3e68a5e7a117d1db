//! Semantic retrieval through an external vector store
pub mod embedder;
pub mod qdrant;

pub use embedder::{Embedder, OllamaEmbedder};
pub use qdrant::QdrantStore;

use crate::errors::{RagError, Result};
use crate::retrieval::{RetrievalSource, Retriever};
use crate::types::{Document, RankedDocumentList};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// External embedding store
#[async_trait]
pub trait SemanticStore: Send + Sync {
    /// Top-k documents by vector similarity to `query`
    async fn search(&self, query: &str, k: usize) -> Result<RankedDocumentList>;

    /// Every stored document; feeds the lexical id lookup
    async fn all_documents(&self) -> Result<Vec<Document>>;
}

/// Thin adapter from a [`SemanticStore`] to the common ranked-list shape
pub struct SemanticRetriever {
    store: Arc<dyn SemanticStore>,
}

impl SemanticRetriever {
    pub fn new(store: Arc<dyn SemanticStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SemanticStore> {
        &self.store
    }
}

#[async_trait]
impl Retriever for SemanticRetriever {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::Semantic
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<RankedDocumentList> {
        let mut documents = self.store.search(query, k).await.map_err(|e| match e {
            RagError::RetrievalUnavailable(_) => e,
            other => RagError::RetrievalUnavailable(other.to_string()),
        })?;

        // stores are trusted for order only when they report scores
        if documents.iter().all(|d| d.score.is_some()) {
            documents.sort_by(|a, b| {
                let (a, b) = (a.score.unwrap_or_default(), b.score.unwrap_or_default());
                b.total_cmp(&a)
            });
        }

        let mut seen = HashSet::new();
        documents.retain(|doc| seen.insert(doc.id().to_string()));
        documents.truncate(k);
        Ok(documents)
    }
}
