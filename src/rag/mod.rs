// Retrieval-augmented generation
//
// Components:
// - Fusion: reciprocal rank fusion of the lexical and semantic lists
// - Reranking: joint (query, document) scoring of fused candidates
// - Context: prompt assembly
// - Answerer: single-query pipeline
// - Multi: concurrent sub-query answering and synthesis

pub mod answerer;
pub mod context;
pub mod fusion;
pub mod multi;
pub mod reranking;

// Re-export key types
pub use answerer::{QueryAnswerer, RetrievalAnswerer};
pub use context::{PromptBuilder, NO_RESULTS_MESSAGE};
pub use fusion::{RankFuser, DEFAULT_RRF_CONSTANT};
pub use multi::{MultiQueryOrchestrator, DEFAULT_MAX_SUBQUERIES};
pub use reranking::{HttpCrossEncoder, RelevanceScorer, Reranker, TermOverlapScorer};
