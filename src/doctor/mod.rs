//! Doctor command for system diagnostics
//!
//! Checks every backend the pipeline talks to. A failed check does not
//! stop the others.

use crate::config::Config;
use crate::llm::OllamaChatClient;
use crate::rag::{HttpCrossEncoder, RelevanceScorer};
use crate::retrieval::{Embedder, LexicalIndex, OllamaEmbedder, QdrantStore};
use crate::types::Document;
use std::sync::Arc;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, HealthStatus::Fail(_))
    }
}

/// True when no check failed; warnings are allowed
pub fn is_healthy(checks: &[HealthCheck]) -> bool {
    !checks.iter().any(HealthCheck::is_failure)
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
}

impl Doctor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = vec![self.check_config()];

        match OllamaChatClient::from_config(&self.config.llm) {
            Ok(client) => {
                checks.push(Self::check_ollama_api(&client).await);
                checks.push(Self::check_generation_model(&client).await);
            }
            Err(e) => checks.push(HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(e.to_string()),
            )),
        }

        checks.push(self.check_embedding().await);
        let (store_check, stored) = self.check_vector_store().await;
        checks.push(store_check);
        checks.push(self.check_lexical_index(stored));
        checks.push(self.check_reranker().await);

        checks
    }

    fn check_config(&self) -> HealthCheck {
        match self.config.validate() {
            Ok(()) => HealthCheck::new("Configuration", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Configuration", HealthStatus::Fail(e.to_string())),
        }
    }

    async fn check_ollama_api(client: &OllamaChatClient) -> HealthCheck {
        if client.health_check().await {
            HealthCheck::new("Ollama API", HealthStatus::Pass)
        } else {
            HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!("{} not reachable", client.base_url())),
            )
        }
    }

    async fn check_generation_model(client: &OllamaChatClient) -> HealthCheck {
        match client.model_available().await {
            Ok(true) => HealthCheck::new("Generation Model", HealthStatus::Pass),
            Ok(false) => HealthCheck::new(
                "Generation Model",
                HealthStatus::Fail(format!(
                    "'{}' is not installed (ollama pull {})",
                    client.model(),
                    client.model()
                )),
            ),
            Err(e) => HealthCheck::new("Generation Model", HealthStatus::Fail(e.to_string())),
        }
    }

    async fn check_embedding(&self) -> HealthCheck {
        let embedder = match OllamaEmbedder::from_config(&self.config.llm, &self.config.embedding) {
            Ok(embedder) => embedder,
            Err(e) => return HealthCheck::new("Embedding Model", HealthStatus::Fail(e.to_string())),
        };

        match embedder.embed("проверка").await {
            Ok(vector) => {
                tracing::debug!(dimensions = vector.len(), "embedding probe ok");
                HealthCheck::new("Embedding Model", HealthStatus::Pass)
            }
            Err(e) => HealthCheck::new("Embedding Model", HealthStatus::Fail(e.to_string())),
        }
    }

    async fn check_vector_store(&self) -> (HealthCheck, Option<u64>) {
        let embedder = match OllamaEmbedder::from_config(&self.config.llm, &self.config.embedding) {
            Ok(embedder) => Arc::new(embedder),
            Err(e) => {
                return (
                    HealthCheck::new("Vector Store", HealthStatus::Fail(e.to_string())),
                    None,
                )
            }
        };

        let store = match QdrantStore::connect(
            &self.config.index.qdrant_url,
            &self.config.index.collection,
            embedder,
        ) {
            Ok(store) => store,
            Err(e) => {
                return (
                    HealthCheck::new("Vector Store", HealthStatus::Fail(e.to_string())),
                    None,
                )
            }
        };

        match store.count().await {
            Ok(0) => (
                HealthCheck::new(
                    "Vector Store",
                    HealthStatus::Warn(format!("collection '{}' is empty", store.collection())),
                ),
                Some(0),
            ),
            Ok(n) => (HealthCheck::new("Vector Store", HealthStatus::Pass), Some(n)),
            Err(e) => (
                HealthCheck::new("Vector Store", HealthStatus::Fail(e.to_string())),
                None,
            ),
        }
    }

    /// Missing index is only a warning: answers still come from the
    /// semantic branch
    fn check_lexical_index(&self, stored: Option<u64>) -> HealthCheck {
        let path = self.config.lexical_index_path();
        match LexicalIndex::load(&path) {
            Ok(index) => match stored {
                Some(n) if n != index.len() as u64 => HealthCheck::new(
                    "Lexical Index",
                    HealthStatus::Warn(format!(
                        "{} rows but the vector store holds {} documents; run build-lexical",
                        index.len(),
                        n
                    )),
                ),
                _ => HealthCheck::new("Lexical Index", HealthStatus::Pass),
            },
            Err(e) => HealthCheck::new("Lexical Index", HealthStatus::Warn(e.to_string())),
        }
    }

    async fn check_reranker(&self) -> HealthCheck {
        let encoder = match HttpCrossEncoder::from_config(&self.config.reranker) {
            Ok(Some(encoder)) => encoder,
            Ok(None) => {
                return HealthCheck::new(
                    "Reranker",
                    HealthStatus::Warn("no cross-encoder configured, using term overlap".to_string()),
                )
            }
            Err(e) => return HealthCheck::new("Reranker", HealthStatus::Fail(e.to_string())),
        };

        match encoder
            .score("проверка", &[Document::new("probe", "проверка связи")])
            .await
        {
            Ok(_) => HealthCheck::new("Reranker", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Reranker", HealthStatus::Warn(e.to_string())),
        }
    }
}
