//! Orchestrator assembly from explicit components or from configuration

use crate::config::Config;
use crate::errors::{RagError, Result};
use crate::llm::{Generator, OllamaChatClient};
use crate::pipeline::orchestrator::PipelineOrchestrator;
use crate::rag::{
    HttpCrossEncoder, MultiQueryOrchestrator, PromptBuilder, QueryAnswerer, RelevanceScorer,
    Reranker, RetrievalAnswerer, TermOverlapScorer,
};
use crate::retrieval::{
    LexicalRetriever, OllamaEmbedder, QdrantStore, Retriever, SemanticRetriever, SemanticStore,
};
use crate::routing::{QueryClassifier, QueryDecomposer};
use crate::telemetry::TelemetryCollector;
use std::sync::Arc;
use tracing::{info, warn};

/// Builder for [`PipelineOrchestrator`]
pub struct PipelineBuilder {
    config: Config,
    generator: Option<Arc<dyn Generator>>,
    lexical: Option<Arc<dyn Retriever>>,
    semantic: Option<Arc<dyn Retriever>>,
    scorer: Option<Arc<dyn RelevanceScorer>>,
    telemetry: TelemetryCollector,
}

impl PipelineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            generator: None,
            lexical: None,
            semantic: None,
            scorer: None,
            telemetry: TelemetryCollector::new(),
        }
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn lexical(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.lexical = Some(retriever);
        self
    }

    pub fn semantic(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.semantic = Some(retriever);
        self
    }

    /// Defaults to [`TermOverlapScorer`]
    pub fn scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn build(self) -> Result<PipelineOrchestrator> {
        self.config.validate()?;

        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;
        let lexical = self
            .lexical
            .ok_or_else(|| RagError::ConfigError("lexical retriever is required".to_string()))?;
        let semantic = self
            .semantic
            .ok_or_else(|| RagError::ConfigError("semantic retriever is required".to_string()))?;
        let scorer = self
            .scorer
            .unwrap_or_else(|| Arc::new(TermOverlapScorer::new()));

        let retrieval = self.config.retrieval;
        let prompts = PromptBuilder::new(retrieval.max_context_chars);
        let telemetry = self.telemetry;

        let answerer: Arc<dyn QueryAnswerer> = Arc::new(RetrievalAnswerer::new(
            lexical,
            semantic,
            Reranker::new(scorer),
            prompts.clone(),
            generator.clone(),
            retrieval.clone(),
            telemetry.clone(),
        ));

        let multi = MultiQueryOrchestrator::new(
            answerer.clone(),
            generator.clone(),
            prompts.clone(),
            retrieval.max_subqueries,
            telemetry.clone(),
        );

        Ok(PipelineOrchestrator::new(
            QueryClassifier::new(generator.clone(), telemetry.clone()),
            QueryDecomposer::new(generator.clone(), telemetry.clone()),
            answerer,
            multi,
            generator,
            prompts,
            telemetry,
        ))
    }

    /// Wire the Ollama, Qdrant and BM25 adapters named in `config`.
    ///
    /// Backends are not required to be up: an unreachable store or a
    /// missing lexical artifact only degrades retrieval at query time.
    pub async fn from_config(config: Config) -> Result<PipelineOrchestrator> {
        config.validate()?;

        let generator: Arc<dyn Generator> = Arc::new(OllamaChatClient::from_config(&config.llm)?);
        let embedder = Arc::new(OllamaEmbedder::from_config(&config.llm, &config.embedding)?);
        let store = Arc::new(QdrantStore::connect(
            &config.index.qdrant_url,
            &config.index.collection,
            embedder,
        )?);

        let documents = match store.all_documents().await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(error = %e, "could not load documents for lexical lookup, retrying per query");
                Vec::new()
            }
        };
        info!(documents = documents.len(), collection = %config.index.collection, "document lookup ready");

        let lexical = LexicalRetriever::open(&config.lexical_index_path(), documents)
            .with_document_source(store.clone());
        let semantic = SemanticRetriever::new(store);

        let scorer: Arc<dyn RelevanceScorer> = match HttpCrossEncoder::from_config(&config.reranker)? {
            Some(encoder) => {
                info!(url = encoder.url(), "using cross-encoder reranker");
                Arc::new(encoder)
            }
            None => Arc::new(TermOverlapScorer::new()),
        };

        PipelineBuilder::new(config)
            .generator(generator)
            .lexical(Arc::new(lexical))
            .semantic(Arc::new(semantic))
            .scorer(scorer)
            .build()
    }
}
