//! Pipeline orchestrator - main coordinator
//!
//! Drives one query through the routing state machine:
//! - classification (chat vs. retrieval)
//! - decomposition (single vs. multi)
//! - the selected branch
//! - response selection
//!
//! All per-request state is local to `process`, so one orchestrator serves
//! concurrent requests and a dropped future leaves nothing behind.

use crate::errors::{RagError, Result};
use crate::llm::Generator;
use crate::pipeline::selector::ResponseSelector;
use crate::pipeline::state::{PipelineEvent, PipelineState};
use crate::rag::{MultiQueryOrchestrator, PromptBuilder, QueryAnswerer};
use crate::routing::{QueryClassifier, QueryDecomposer};
use crate::telemetry::{Stage, TelemetryCollector, TelemetryEvent};
use crate::types::{Branch, PipelineResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Main pipeline orchestrator
pub struct PipelineOrchestrator {
    classifier: QueryClassifier,
    decomposer: QueryDecomposer,
    answerer: Arc<dyn QueryAnswerer>,
    multi: MultiQueryOrchestrator,
    generator: Arc<dyn Generator>,
    prompts: PromptBuilder,
    selector: ResponseSelector,
    telemetry: TelemetryCollector,
}

/// Current state of one request, mirrored into telemetry
struct StateTracker<'a> {
    state: PipelineState,
    telemetry: &'a TelemetryCollector,
}

impl<'a> StateTracker<'a> {
    fn new(telemetry: &'a TelemetryCollector) -> Self {
        Self {
            state: PipelineState::Received,
            telemetry,
        }
    }

    fn advance(&mut self, event: PipelineEvent) -> Result<()> {
        let next = self.state.transition(event)?;
        debug!(from = self.state.display_name(), to = next.display_name(), "state transition");
        self.telemetry.record(TelemetryEvent::StateTransition {
            from: self.state.display_name().to_string(),
            to: next.display_name().to_string(),
            timestamp: Instant::now(),
        });
        self.state = next;
        Ok(())
    }
}

impl PipelineOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: QueryClassifier,
        decomposer: QueryDecomposer,
        answerer: Arc<dyn QueryAnswerer>,
        multi: MultiQueryOrchestrator,
        generator: Arc<dyn Generator>,
        prompts: PromptBuilder,
        telemetry: TelemetryCollector,
    ) -> Self {
        Self {
            classifier,
            decomposer,
            answerer,
            multi,
            generator,
            prompts,
            selector: ResponseSelector::new(),
            telemetry,
        }
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Answer text only
    pub async fn answer(&self, query: &str) -> Result<String> {
        self.process(query).await.map(|result| result.answer)
    }

    /// Answer with a caller-side deadline
    pub async fn answer_with_timeout(&self, query: &str, deadline: Duration) -> Result<String> {
        self.process_with_timeout(query, deadline)
            .await
            .map(|result| result.answer)
    }

    /// [`process`](Self::process) bounded by `deadline`; expiry is
    /// `RagError::Timeout`
    pub async fn process_with_timeout(&self, query: &str, deadline: Duration) -> Result<PipelineResult> {
        tokio::time::timeout(deadline, self.process(query))
            .await
            .map_err(|_| RagError::Timeout {
                duration_ms: deadline.as_millis() as u64,
            })?
    }

    /// Answer plus the branch that produced it.
    ///
    /// Blank queries are rejected before any backend call.
    pub async fn process(&self, query: &str) -> Result<PipelineResult> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query is empty".to_string()));
        }

        let request_id = Uuid::new_v4();
        let span = info_span!("answer", %request_id);
        self.route(request_id, query).instrument(span).await
    }

    async fn route(&self, request_id: Uuid, query: &str) -> Result<PipelineResult> {
        let started = Instant::now();
        let mut tracker = StateTracker::new(&self.telemetry);
        info!(query_chars = query.chars().count(), "query received");

        let needs_search = self.classifier.needs_search(query).await?;
        tracker.advance(PipelineEvent::Classify)?;

        let (mut chat, mut rag, mut multi) = (None, None, None);
        let mut subqueries = Vec::new();

        let branch = if !needs_search {
            tracker.advance(PipelineEvent::SkipSearch)?;
            self.select_branch(Branch::NoSearch);

            let generation = Instant::now();
            chat = Some(self.generator.generate(&self.prompts.conversational(query)).await?);
            self.telemetry.stage(Stage::Generation, 1, generation);
            Branch::NoSearch
        } else {
            let list = self.decomposer.decompose(query).await;
            tracker.advance(PipelineEvent::Decompose)?;

            let branch = Branch::route(true, list.len());
            if let Some(event) = PipelineEvent::for_branch(branch) {
                tracker.advance(event)?;
            }
            self.select_branch(branch);

            subqueries = list.into_vec();
            match branch {
                Branch::Multi => {
                    multi = Some(self.multi.answer_multi(&subqueries, query).await?);
                }
                _ => {
                    rag = Some(self.answerer.answer(&subqueries[0]).await?);
                }
            }
            branch
        };

        tracker.advance(PipelineEvent::Answer)?;
        let answer = self.selector.select(chat, rag, multi);

        info!(
            %branch,
            answer_chars = answer.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query answered"
        );

        Ok(PipelineResult {
            request_id,
            answer,
            branch,
            subqueries,
        })
    }

    fn select_branch(&self, branch: Branch) {
        self.telemetry.record(TelemetryEvent::BranchSelected {
            branch,
            timestamp: Instant::now(),
        });
    }
}
