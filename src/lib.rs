//! chathrd - routed retrieval-augmented question answering
//!
//! Answers questions over an internal knowledge base served by a local
//! Ollama model.
//!
//! # Architecture
//!
//! - **Routing**: an LLM classifier decides between plain chat and
//!   retrieval; an LLM decomposer splits compound questions
//! - **Retrieval**: BM25L lexical index and Qdrant vector search, run
//!   concurrently and merged by reciprocal rank fusion
//! - **RAG**: reranking, grounded prompting, sub-query fan-out and
//!   synthesis
//! - **Pipeline**: typed state machine and the `answer(query)` entry point

pub mod errors;
pub mod types;

pub mod config;
pub mod llm;
pub mod retrieval;
pub mod rag;
pub mod routing;
pub mod pipeline;

pub mod telemetry;
pub mod doctor;
pub mod cli;

// Re-export commonly used types
pub use config::Config;
pub use errors::{RagError, Result};
pub use pipeline::{PipelineBuilder, PipelineOrchestrator};
pub use types::{Branch, Document, PipelineResult};
