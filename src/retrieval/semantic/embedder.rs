//! Query embedding through Ollama's `/api/embeddings`

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding requests are short; they should not inherit the generation timeout
const EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Text to dense vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embedder served by the same Ollama instance as generation
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn from_config(llm: &LlmConfig, embedding: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(EMBED_TIMEOUT)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            model: embedding.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| RagError::RetrievalUnavailable(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RagError::RetrievalUnavailable(format!(
                "Embedding service returned HTTP {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            RagError::RetrievalUnavailable(format!("Malformed embedding response: {}", e))
        })?;

        if body.embedding.is_empty() {
            return Err(RagError::RetrievalUnavailable(format!(
                "Model '{}' returned an empty embedding",
                self.model
            )));
        }

        Ok(body.embedding)
    }
}
