//! Final pipeline output

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which exit of the routing state machine produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    /// Conversational reply, no retrieval
    NoSearch,
    /// One retrieval-augmented answer
    Single,
    /// Aggregated answer over several sub-queries
    Multi,
}

impl Branch {
    /// Branch is fully determined by the classifier verdict and the number
    /// of sub-queries.
    pub fn route(needs_search: bool, subquery_count: usize) -> Self {
        match (needs_search, subquery_count) {
            (false, _) => Branch::NoSearch,
            (true, n) if n > 1 => Branch::Multi,
            (true, _) => Branch::Single,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::NoSearch => "no_search",
            Branch::Single => "single",
            Branch::Multi => "multi",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer plus the branch that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub request_id: Uuid,
    pub answer: String,
    pub branch: Branch,
    /// Sub-queries that were routed (empty on the no-search branch)
    pub subqueries: Vec<String>,
}
