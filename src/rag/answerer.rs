//! Single-query retrieval-augmented answering
//!
//! normalize -> (lexical || semantic) -> fuse -> rerank -> prompt -> generate
//!
//! Retrieval and rerank failures degrade to fewer candidates. Only the
//! generation call can fail the answer.

use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::llm::Generator;
use crate::rag::context::PromptBuilder;
use crate::rag::fusion::RankFuser;
use crate::rag::reranking::Reranker;
use crate::retrieval::{normalize, Retriever, RetrievalSource};
use crate::telemetry::{Stage, TelemetryCollector};
use crate::types::{Document, RankedDocumentList};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Anything that turns one query into one answer
#[async_trait]
pub trait QueryAnswerer: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String>;
}

/// Retrieval-augmented answerer
pub struct RetrievalAnswerer {
    lexical: Arc<dyn Retriever>,
    semantic: Arc<dyn Retriever>,
    fuser: RankFuser,
    reranker: Reranker,
    prompts: PromptBuilder,
    generator: Arc<dyn Generator>,
    config: RetrievalConfig,
    telemetry: TelemetryCollector,
}

impl RetrievalAnswerer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lexical: Arc<dyn Retriever>,
        semantic: Arc<dyn Retriever>,
        reranker: Reranker,
        prompts: PromptBuilder,
        generator: Arc<dyn Generator>,
        config: RetrievalConfig,
        telemetry: TelemetryCollector,
    ) -> Self {
        Self {
            lexical,
            semantic,
            fuser: RankFuser::new(config.rrf_constant),
            reranker,
            prompts,
            generator,
            config,
            telemetry,
        }
    }

    /// Grounding documents for `query`; never fails
    pub async fn retrieve_context(&self, query: &str) -> Vec<Document> {
        let normalized = normalize(query);
        let search_text = if normalized.is_empty() {
            query.trim()
        } else {
            normalized.as_str()
        };

        let (lexical, semantic) = tokio::join!(
            self.run_retriever(&self.lexical, search_text, self.config.lexical_top_k),
            self.run_retriever(&self.semantic, search_text, self.config.semantic_top_k),
        );

        let started = Instant::now();
        let fused = self.fuser.fuse(&[lexical, semantic], self.config.fusion_top_k);
        self.telemetry.stage(Stage::Fusion, fused.len(), started);

        let started = Instant::now();
        let fallback: Vec<Document> = fused
            .iter()
            .take(self.config.rerank_top_k)
            .cloned()
            .collect();

        let reranked = match self
            .reranker
            .rerank(query, fused, self.config.rerank_top_k)
            .await
        {
            Ok(documents) => documents,
            Err(e) => {
                warn!(scorer = self.reranker.scorer_name(), error = %e, "rerank failed, keeping fused order");
                self.telemetry.degraded(Stage::Rerank, e.to_string());
                fallback
            }
        };
        self.telemetry.stage(Stage::Rerank, reranked.len(), started);

        debug!(documents = reranked.len(), "context ready");
        reranked
    }

    async fn run_retriever(
        &self,
        retriever: &Arc<dyn Retriever>,
        query: &str,
        k: usize,
    ) -> RankedDocumentList {
        let stage = match retriever.source() {
            RetrievalSource::Lexical => Stage::LexicalRetrieval,
            RetrievalSource::Semantic => Stage::SemanticRetrieval,
        };
        let started = Instant::now();

        let documents = match retriever.retrieve(query, k).await {
            Ok(documents) => documents,
            Err(e) => {
                if e.is_recoverable() {
                    warn!(source = %retriever.source(), error = %e, "retrieval unavailable");
                } else {
                    warn!(source = %retriever.source(), error = %e, "retrieval failed");
                }
                self.telemetry.degraded(stage, e.to_string());
                Vec::new()
            }
        };

        self.telemetry.stage(stage, documents.len(), started);
        documents
    }
}

#[async_trait]
impl QueryAnswerer for RetrievalAnswerer {
    async fn answer(&self, query: &str) -> Result<String> {
        let documents = self.retrieve_context(query).await;
        let messages = self.prompts.grounded(query, &documents);

        let started = Instant::now();
        let reply = self.generator.generate(&messages).await?;
        self.telemetry.stage(Stage::Generation, 1, started);

        Ok(reply)
    }
}
