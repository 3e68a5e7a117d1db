//! Lexical (BM25L) retrieval
pub mod index;
pub mod retriever;

pub use index::{Bm25Params, LexicalIndex, FORMAT_VERSION};
pub use retriever::LexicalRetriever;

use crate::errors::Result;
use crate::retrieval::SemanticStore;
use std::path::Path;
use tracing::info;

/// Rebuild the artifact at `path` from every document in `store`.
///
/// Rows and identifiers are written together, so the saved index is
/// always aligned. Returns the number of indexed documents.
pub async fn build_from_store(store: &dyn SemanticStore, path: &Path, params: Bm25Params) -> Result<usize> {
    let documents = store.all_documents().await?;
    let index = LexicalIndex::build(&documents, params);
    index.save(path)?;

    info!(path = %path.display(), documents = index.len(), "lexical index written");
    Ok(index.len())
}
