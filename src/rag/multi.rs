//! Fan-out answering for decomposed queries
//!
//! Sub-queries run concurrently through the same answerer. The synthesis
//! call waits for every attempt; a failed sub-query only loses its part.

use crate::errors::Result;
use crate::llm::Generator;
use crate::rag::answerer::QueryAnswerer;
use crate::rag::context::{PromptBuilder, NO_RESULTS_MESSAGE};
use crate::telemetry::{Stage, TelemetryCollector, TelemetryEvent};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Default fan-out cap
pub const DEFAULT_MAX_SUBQUERIES: usize = 3;

/// Multi-query orchestrator
pub struct MultiQueryOrchestrator {
    answerer: Arc<dyn QueryAnswerer>,
    generator: Arc<dyn Generator>,
    prompts: PromptBuilder,
    max_subqueries: usize,
    telemetry: TelemetryCollector,
}

impl MultiQueryOrchestrator {
    pub fn new(
        answerer: Arc<dyn QueryAnswerer>,
        generator: Arc<dyn Generator>,
        prompts: PromptBuilder,
        max_subqueries: usize,
        telemetry: TelemetryCollector,
    ) -> Self {
        Self {
            answerer,
            generator,
            prompts,
            max_subqueries: max_subqueries.max(1),
            telemetry,
        }
    }

    pub fn max_subqueries(&self) -> usize {
        self.max_subqueries
    }

    /// Answer the first `max_subqueries` sub-queries and synthesize one reply.
    ///
    /// Returns [`NO_RESULTS_MESSAGE`] when no sub-query produced text. Only
    /// a failure of the synthesis call itself is an error.
    pub async fn answer_multi(&self, subqueries: &[String], original_query: &str) -> Result<String> {
        if subqueries.len() > self.max_subqueries {
            info!(
                requested = subqueries.len(),
                kept = self.max_subqueries,
                "dropping excess sub-queries"
            );
        }
        let retained = &subqueries[..subqueries.len().min(self.max_subqueries)];

        let attempts = join_all(retained.iter().map(|sq| self.answerer.answer(sq))).await;

        let mut parts: Vec<(usize, &str, String)> = Vec::new();
        for (index, (subquery, attempt)) in retained.iter().zip(attempts).enumerate() {
            match attempt {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(index, chars = text.len(), "sub-query answered");
                    parts.push((index + 1, subquery.as_str(), text));
                }
                Ok(_) => {
                    self.subquery_failed(index, subquery, "empty reply");
                }
                Err(e) => {
                    self.subquery_failed(index, subquery, &e.to_string());
                }
            }
        }

        if parts.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let borrowed: Vec<(usize, &str, &str)> = parts
            .iter()
            .map(|(position, subquery, text)| (*position, *subquery, text.as_str()))
            .collect();
        let messages = self.prompts.synthesis(original_query, &borrowed);

        let started = Instant::now();
        let answer = self.generator.generate(&messages).await?;
        self.telemetry.stage(Stage::Synthesis, parts.len(), started);

        Ok(answer)
    }

    fn subquery_failed(&self, index: usize, subquery: &str, reason: &str) {
        error!(index, subquery, reason, "sub-query failed");
        self.telemetry.record(TelemetryEvent::SubqueryFailed {
            index,
            reason: reason.to_string(),
            timestamp: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RagError;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails for queries containing "fail", echoes the rest
    struct EchoAnswerer {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QueryAnswerer for EchoAnswerer {
        async fn answer(&self, query: &str) -> Result<String> {
            self.calls.lock().unwrap().push(query.to_string());
            if query.contains("fail") {
                return Err(RagError::GenerationTimeout { timeout_secs: 1 });
            }
            if query.contains("blank") {
                return Ok("   ".to_string());
            }
            Ok(format!("answer to {}", query))
        }
    }

    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages[0].content.clone());
            Ok("synthesized".to_string())
        }
    }

    /// Answers only once every sub-query sharing the barrier has started
    struct GatedAnswerer {
        gate: tokio::sync::Barrier,
    }

    #[async_trait]
    impl QueryAnswerer for GatedAnswerer {
        async fn answer(&self, query: &str) -> Result<String> {
            self.gate.wait().await;
            Ok(format!("answer to {}", query))
        }
    }

    fn setup() -> (Arc<EchoAnswerer>, Arc<RecordingGenerator>, MultiQueryOrchestrator, TelemetryCollector) {
        let answerer = Arc::new(EchoAnswerer {
            calls: Mutex::new(Vec::new()),
        });
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let telemetry = TelemetryCollector::new();
        let orchestrator = MultiQueryOrchestrator::new(
            answerer.clone(),
            generator.clone(),
            PromptBuilder::default(),
            DEFAULT_MAX_SUBQUERIES,
            telemetry.clone(),
        );
        (answerer, generator, orchestrator, telemetry)
    }

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_only_first_three_are_processed() {
        let (answerer, _, orchestrator, _) = setup();
        orchestrator
            .answer_multi(&queries(&["a", "b", "c", "d", "e"]), "abcde")
            .await
            .unwrap();

        let mut calls = answerer.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let (_, generator, orchestrator, telemetry) = setup();
        let answer = orchestrator
            .answer_multi(&queries(&["fail first", "second"]), "both")
            .await
            .unwrap();

        assert_eq!(answer, "synthesized");
        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Часть 2 (second): answer to second"));
        assert!(!prompt.contains("fail first"));
        assert_eq!(telemetry.get_stats().failed_subqueries, 1);
        assert_eq!(telemetry.get_stats().syntheses, 1);
    }

    #[tokio::test]
    async fn test_all_failures_return_apology() {
        let (_, generator, orchestrator, telemetry) = setup();
        let answer = orchestrator
            .answer_multi(&queries(&["fail one", "blank two"]), "q")
            .await
            .unwrap();

        assert_eq!(answer, NO_RESULTS_MESSAGE);
        assert!(generator.prompts.lock().unwrap().is_empty());
        assert_eq!(telemetry.get_stats().failed_subqueries, 2);
    }

    #[tokio::test]
    async fn test_subqueries_run_concurrently_before_synthesis() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let orchestrator = MultiQueryOrchestrator::new(
            Arc::new(GatedAnswerer {
                gate: tokio::sync::Barrier::new(3),
            }),
            generator.clone(),
            PromptBuilder::default(),
            DEFAULT_MAX_SUBQUERIES,
            TelemetryCollector::new(),
        );

        // a sequential fan-out would park the first sub-query on the barrier
        let answer = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            orchestrator.answer_multi(&queries(&["a", "b", "c"]), "abc"),
        )
        .await
        .expect("all sub-queries in flight together")
        .unwrap();

        assert_eq!(answer, "synthesized");
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        for part in ["Часть 1 (a): answer to a", "Часть 2 (b): answer to b", "Часть 3 (c): answer to c"] {
            assert!(prompts[0].contains(part));
        }
    }

    #[test]
    fn test_cap_is_at_least_one() {
        let (answerer, generator, _, telemetry) = setup();
        let orchestrator =
            MultiQueryOrchestrator::new(answerer, generator, PromptBuilder::default(), 0, telemetry);
        assert_eq!(orchestrator.max_subqueries(), 1);
    }
}
