//! LLM-driven query routing
//!
//! The classifier picks between plain chat and retrieval; the decomposer
//! decides between one retrieval pass and a fan-out.

pub mod classifier;
pub mod decomposer;
pub mod parse;

pub use classifier::QueryClassifier;
pub use decomposer::QueryDecomposer;
pub use parse::{parse_lenient_bool, parse_subqueries};
