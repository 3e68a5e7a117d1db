//! Shared test doubles for pipeline integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chathrd::errors::{RagError, Result};
use chathrd::llm::Generator;
use chathrd::retrieval::{RetrievalSource, Retriever, SemanticStore};
use chathrd::telemetry::TelemetryCollector;
use chathrd::types::{ChatMessage, Document, RankedDocumentList};
use chathrd::{Config, PipelineBuilder, PipelineOrchestrator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

/// Marker substrings of the routing prompts
pub const CLASSIFY: &str = "классификатор запросов";
pub const CHECK: &str = "эксперт по обработке запросов";
pub const DECOMPOSE: &str = "специалист по декомпозиции";
pub const SYNTHESIS: &str = "На основе ответов на части вопроса";
pub const CHAT: &str = "дружелюбный помощник";

/// Grounded prompt marker for one (sub-)query
pub fn grounded(query: &str) -> String {
    format!("Вопрос: {}\n", query)
}

#[derive(Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// Generator that answers by the first rule whose marker occurs in the
/// prompt; unmatched prompts get "default reply"
pub struct ScriptedGenerator {
    rules: Vec<(String, Reply)>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn reply(mut self, marker: impl Into<String>, text: impl Into<String>) -> Self {
        self.rules.push((marker.into(), Reply::Text(text.into())));
        self
    }

    pub fn fail(mut self, marker: impl Into<String>) -> Self {
        self.rules.push((marker.into(), Reply::Fail));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts containing `marker`, in call order
    pub fn prompts_with(&self, marker: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(marker))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(RagError::GenerationFailure("scripted failure".to_string())),
            None => Ok("default reply".to_string()),
        }
    }
}

/// Retriever that returns a fixed list and counts calls
pub struct CountingRetriever {
    source: RetrievalSource,
    documents: Vec<Document>,
    fail: bool,
    gate: Option<Arc<Barrier>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl CountingRetriever {
    pub fn new(source: RetrievalSource, documents: Vec<Document>) -> Arc<Self> {
        Arc::new(Self {
            source,
            documents,
            fail: false,
            gate: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(source: RetrievalSource) -> Arc<Self> {
        Arc::new(Self {
            source,
            documents: Vec::new(),
            fail: true,
            gate: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Returns only after every retriever sharing `gate` has been called
    pub fn gated(source: RetrievalSource, documents: Vec<Document>, gate: Arc<Barrier>) -> Arc<Self> {
        Arc::new(Self {
            source,
            documents,
            fail: false,
            gate: Some(gate),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for CountingRetriever {
    fn source(&self) -> RetrievalSource {
        self.source
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<RankedDocumentList> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if self.fail {
            return Err(RagError::RetrievalUnavailable("store offline".to_string()));
        }
        Ok(self.documents.iter().take(k).cloned().collect())
    }
}

/// Vector store double: ranks by shared lowercase words
pub struct InMemoryStore {
    documents: Vec<Document>,
}

impl InMemoryStore {
    pub fn new(documents: Vec<Document>) -> Arc<Self> {
        Arc::new(Self { documents })
    }
}

#[async_trait]
impl SemanticStore for InMemoryStore {
    async fn search(&self, query: &str, k: usize) -> Result<RankedDocumentList> {
        let words: Vec<String> = query.to_lowercase().split_whitespace().map(str::to_string).collect();
        let mut scored: Vec<Document> = self
            .documents
            .iter()
            .map(|doc| {
                let content = doc.content.to_lowercase();
                let hits = words.iter().filter(|w| content.contains(w.as_str())).count();
                doc.clone().with_score(hits as f64)
            })
            .filter(|doc| doc.score.unwrap_or(0.0) > 0.0)
            .collect();
        scored.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));
        scored.truncate(k);
        Ok(scored)
    }

    async fn all_documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

pub fn corpus() -> Vec<Document> {
    vec![
        Document::new("gdpr", "GDPR — общий регламент ЕС по защите персональных данных")
            .with_metadata("file_name", serde_json::json!("gdpr.pdf")),
        Document::new("vacation", "Ежегодный оплачиваемый отпуск составляет 28 календарных дней")
            .with_metadata("file_name", serde_json::json!("leave_policy.docx")),
        Document::new("policy", "Новая политика отпусков вступает в силу с 1 января")
            .with_metadata("file_name", serde_json::json!("leave_policy.docx")),
    ]
}

/// Orchestrator over the given doubles plus its telemetry
pub fn pipeline(
    generator: Arc<ScriptedGenerator>,
    lexical: Arc<dyn Retriever>,
    semantic: Arc<dyn Retriever>,
) -> (PipelineOrchestrator, TelemetryCollector) {
    let telemetry = TelemetryCollector::new();
    let orchestrator = PipelineBuilder::new(Config::default())
        .generator(generator)
        .lexical(lexical)
        .semantic(semantic)
        .telemetry(telemetry.clone())
        .build()
        .expect("pipeline builds");
    (orchestrator, telemetry)
}
