//! Generation backend seam
//!
//! Every prompt in the pipeline goes through [`Generator`]. The production
//! implementation talks to Ollama; tests script replies.

pub mod client;

pub use client::{OllamaChatClient, DEFAULT_OLLAMA_URL};

use crate::errors::Result;
use crate::types::ChatMessage;
use async_trait::async_trait;

/// Black-box text generation: role-tagged messages in, reply text out.
///
/// Replies are not deterministic. Implementations enforce their own
/// per-call timeout and report it as `RagError::GenerationTimeout`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}
