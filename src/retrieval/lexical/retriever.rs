//! Lexical retriever over a loaded BM25L artifact
//!
//! The artifact stores identifiers only, so the retriever carries an
//! id -> Document lookup built from the vector store's full document list.
//! An empty lookup is refilled from the store on the next query.

use crate::errors::{RagError, Result};
use crate::retrieval::lexical::LexicalIndex;
use crate::retrieval::normalizer::tokenize;
use crate::retrieval::{RetrievalSource, Retriever, SemanticStore};
use crate::types::{Document, RankedDocumentList};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// BM25L retriever
pub struct LexicalRetriever {
    index: std::result::Result<Arc<LexicalIndex>, String>,
    documents: RwLock<HashMap<String, Document>>,
    source: Option<Arc<dyn SemanticStore>>,
}

impl LexicalRetriever {
    /// Create from an in-memory index and its documents
    pub fn new(index: LexicalIndex, documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            index: Ok(Arc::new(index)),
            documents: RwLock::new(Self::lookup(documents)),
            source: None,
        }
    }

    /// Load the artifact at `path`.
    ///
    /// A missing or corrupt artifact does not fail construction: every
    /// retrieval then reports `IndexUnavailable` and the pipeline answers
    /// from the semantic branch alone.
    pub fn open(path: &Path, documents: impl IntoIterator<Item = Document>) -> Self {
        let index = match LexicalIndex::load(path) {
            Ok(index) => {
                debug!(path = %path.display(), rows = index.len(), "lexical index loaded");
                Ok(Arc::new(index))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "lexical index unavailable");
                Err(e.to_string())
            }
        };

        Self {
            index,
            documents: RwLock::new(Self::lookup(documents)),
            source: None,
        }
    }

    /// Store used to refill the lookup while it is empty
    pub fn with_document_source(mut self, store: Arc<dyn SemanticStore>) -> Self {
        self.source = Some(store);
        self
    }

    /// Retriever whose index could not be obtained
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            index: Err(reason.into()),
            documents: RwLock::new(HashMap::new()),
            source: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.index.is_ok()
    }

    /// Number of documents resolvable by identifier
    pub fn document_count(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    fn lookup(documents: impl IntoIterator<Item = Document>) -> HashMap<String, Document> {
        documents
            .into_iter()
            .map(|doc| (doc.id().to_string(), doc))
            .collect()
    }

    /// Pull the full document list from the store when the lookup is empty.
    ///
    /// Fails with `IndexUnavailable` while no documents can be resolved, so
    /// every affected query is reported as degraded.
    async fn ensure_lookup(&self) -> Result<()> {
        if self.document_count() > 0 {
            return Ok(());
        }

        let Some(store) = &self.source else {
            return Err(RagError::IndexUnavailable(
                "no documents to resolve lexical hits".to_string(),
            ));
        };

        let documents = store.all_documents().await.map_err(|e| {
            RagError::IndexUnavailable(format!("document lookup could not be loaded: {}", e))
        })?;
        if documents.is_empty() {
            return Err(RagError::IndexUnavailable(
                "document store returned no documents".to_string(),
            ));
        }

        let lookup = Self::lookup(documents);
        info!(documents = lookup.len(), "lexical document lookup refilled");
        let mut guard = self
            .documents
            .write()
            .map_err(|_| RagError::IndexUnavailable("document lookup lock poisoned".to_string()))?;
        if guard.is_empty() {
            *guard = lookup;
        }
        Ok(())
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::Lexical
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<RankedDocumentList> {
        let index = self
            .index
            .as_ref()
            .map_err(|reason| RagError::IndexUnavailable(reason.clone()))?;

        if !index.is_empty() {
            self.ensure_lookup().await?;
        }

        let tokens = tokenize(&query.to_lowercase());
        let ranked = index.top_k(&tokens, k);

        let lookup = self
            .documents
            .read()
            .map_err(|_| RagError::IndexUnavailable("document lookup lock poisoned".to_string()))?;

        // rows whose identifier is unknown to the store are skipped
        let documents: RankedDocumentList = ranked
            .into_iter()
            .filter_map(|(row, score)| {
                let id = index.id(row)?;
                lookup.get(id).map(|doc| doc.clone().with_score(score))
            })
            .collect();

        Ok(documents)
    }
}
