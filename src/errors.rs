//! Error types for the chathrd answering pipeline
//!
//! Retrieval-side failures are absorbed by the pipeline (a branch degrades
//! to an empty document list). Generation-side failures propagate to the
//! caller unless a multi-query fan-out can drop the failing sub-query.

use thiserror::Error;

/// Main error type for the answering pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Query was empty or whitespace only
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Lexical index artifact missing, corrupt, or misaligned
    #[error("Lexical index unavailable: {0}")]
    IndexUnavailable(String),

    /// Vector store or embedding service unreachable
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Generation backend did not answer in time
    #[error("Generation timed out after {timeout_secs}s")]
    GenerationTimeout { timeout_secs: u64 },

    /// Generation backend failed or returned an unusable reply
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// Relevance scoring service failed
    #[error("Rerank failed: {0}")]
    RerankFailure(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline state machine errors
    #[error("Invalid state transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    /// Caller-side deadline expired
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl RagError {
    /// Retrieval-side errors degrade a branch to zero documents instead of
    /// failing the query.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RagError::IndexUnavailable(_)
                | RagError::RetrievalUnavailable(_)
                | RagError::RerankFailure(_)
        )
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(err.to_string())
    }
}
