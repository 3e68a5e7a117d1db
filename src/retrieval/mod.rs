//! Candidate retrieval
//!
//! Two independent indexes feed the fuser:
//! - Lexical: BM25L over a prebuilt term-frequency artifact
//! - Semantic: vector similarity through an external store
//!
//! Both sit behind [`Retriever`] so the answerer can run them concurrently
//! and tests can count calls.

pub mod lexical;
pub mod normalizer;
pub mod semantic;

pub use lexical::{Bm25Params, LexicalIndex, LexicalRetriever};
pub use normalizer::{normalize, tokenize};
pub use semantic::{Embedder, OllamaEmbedder, QdrantStore, SemanticRetriever, SemanticStore};

use crate::errors::Result;
use crate::types::RankedDocumentList;
use async_trait::async_trait;
use std::fmt;

/// Which index produced a ranked list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalSource {
    Lexical,
    Semantic,
}

impl fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalSource::Lexical => f.write_str("lexical"),
            RetrievalSource::Semantic => f.write_str("semantic"),
        }
    }
}

/// Top-k retrieval from one index.
///
/// Errors are expected to be recoverable (`IndexUnavailable`,
/// `RetrievalUnavailable`); callers degrade them to an empty list.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn source(&self) -> RetrievalSource;

    async fn retrieve(&self, query: &str, k: usize) -> Result<RankedDocumentList>;
}
