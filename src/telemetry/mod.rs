//! Telemetry for the answering pipeline
//!
//! Records stage timings, branch decisions and degraded retrievals. The
//! collector is cheap to clone and safe to share across concurrent
//! requests; the event log is bounded.

use crate::types::Branch;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Events kept in memory before the oldest are dropped
const MAX_EVENTS: usize = 1024;

/// Pipeline stages that report timings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classification,
    Decomposition,
    LexicalRetrieval,
    SemanticRetrieval,
    Fusion,
    Rerank,
    Generation,
    Synthesis,
}

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    StateTransition {
        from: String,
        to: String,
        timestamp: Instant,
    },
    BranchSelected {
        branch: Branch,
        timestamp: Instant,
    },
    StageCompleted {
        stage: Stage,
        /// Documents or replies produced by the stage
        items: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    /// A retrieval branch or the reranker failed and was bypassed
    RetrievalDegraded {
        stage: Stage,
        reason: String,
        timestamp: Instant,
    },
    SubqueryFailed {
        index: usize,
        reason: String,
        timestamp: Instant,
    },
}

/// Aggregated counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub requests: usize,
    pub no_search_answers: usize,
    pub single_answers: usize,
    pub multi_answers: usize,
    pub classifications: usize,
    pub decompositions: usize,
    pub lexical_retrievals: usize,
    pub semantic_retrievals: usize,
    pub fusions: usize,
    pub reranks: usize,
    pub generations: usize,
    pub syntheses: usize,
    pub degraded_retrievals: usize,
    pub failed_subqueries: usize,
    pub state_transitions: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<VecDeque<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        if let Ok(mut stats) = self.stats.lock() {
            match &event {
                TelemetryEvent::StateTransition { .. } => stats.state_transitions += 1,
                TelemetryEvent::BranchSelected { branch, .. } => {
                    stats.requests += 1;
                    match branch {
                        Branch::NoSearch => stats.no_search_answers += 1,
                        Branch::Single => stats.single_answers += 1,
                        Branch::Multi => stats.multi_answers += 1,
                    }
                }
                TelemetryEvent::StageCompleted { stage, .. } => match stage {
                    Stage::Classification => stats.classifications += 1,
                    Stage::Decomposition => stats.decompositions += 1,
                    Stage::LexicalRetrieval => stats.lexical_retrievals += 1,
                    Stage::SemanticRetrieval => stats.semantic_retrievals += 1,
                    Stage::Fusion => stats.fusions += 1,
                    Stage::Rerank => stats.reranks += 1,
                    Stage::Generation => stats.generations += 1,
                    Stage::Synthesis => stats.syntheses += 1,
                },
                TelemetryEvent::RetrievalDegraded { .. } => stats.degraded_retrievals += 1,
                TelemetryEvent::SubqueryFailed { .. } => stats.failed_subqueries += 1,
            }
        }

        if let Ok(mut events) = self.events.lock() {
            if events.len() == MAX_EVENTS {
                events.pop_front();
            }
            events.push_back(event);
        }
    }

    /// Record a completed stage with its duration
    pub fn stage(&self, stage: Stage, items: usize, started: Instant) {
        self.record(TelemetryEvent::StageCompleted {
            stage,
            items,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Instant::now(),
        });
    }

    /// Record a bypassed retrieval or rerank stage
    pub fn degraded(&self, stage: Stage, reason: impl Into<String>) {
        self.record(TelemetryEvent::RetrievalDegraded {
            stage,
            reason: reason.into(),
            timestamp: Instant::now(),
        });
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(events) => {
                let start = events.len().saturating_sub(n);
                events.iter().skip(start).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Mean duration of a stage over the retained events
    pub fn mean_stage_ms(&self, wanted: Stage) -> Option<f64> {
        let events = self.events.lock().ok()?;
        let durations: Vec<u64> = events
            .iter()
            .filter_map(|event| match event {
                TelemetryEvent::StageCompleted {
                    stage, duration_ms, ..
                } if *stage == wanted => Some(*duration_ms),
                _ => None,
            })
            .collect();

        if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<u64>() as f64 / durations.len() as f64)
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable session summary
pub fn format_summary(collector: &TelemetryCollector) -> String {
    let stats = collector.get_stats();
    let mut out = String::new();
    out.push_str("Session Summary\n");
    out.push_str("-------------------------------------\n");
    out.push_str(&format!("Duration:          {:?}\n", collector.elapsed()));
    out.push_str(&format!(
        "Requests:          {} (chat {}, single {}, multi {})\n",
        stats.requests, stats.no_search_answers, stats.single_answers, stats.multi_answers
    ));
    out.push_str(&format!("Generations:       {}\n", stats.generations + stats.syntheses));
    out.push_str(&format!("Degraded stages:   {}\n", stats.degraded_retrievals));
    out.push_str(&format!("Failed subqueries: {}\n", stats.failed_subqueries));
    if let Some(ms) = collector.mean_stage_ms(Stage::Generation) {
        out.push_str(&format!("Mean generation:   {:.0}ms\n", ms));
    }
    out
}
