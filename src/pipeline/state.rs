//! Routing state machine
//!
//! One pass per query, no backtracking:
//! - Received -> Classified
//! - Classified -> ConversationalBranch (no search) | Decomposed (search)
//! - Decomposed -> SingleBranch (one sub-query) | MultiBranch (several)
//! - any branch -> Answered

use crate::errors::{RagError, Result};
use crate::types::Branch;
use serde::{Deserialize, Serialize};

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    /// Query accepted, nothing decided yet
    Received,

    /// Search verdict known
    Classified,

    /// Direct chat reply, no retrieval
    ConversationalBranch,

    /// Sub-queries known
    Decomposed,

    /// One retrieval-augmented answer
    SingleBranch,

    /// Concurrent sub-query answers plus synthesis
    MultiBranch,

    /// Reply selected (terminal)
    Answered,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Classifier replied
    Classify,

    /// Classifier said no search
    SkipSearch,

    /// Decomposer replied
    Decompose,

    /// Exactly one sub-query
    RouteSingle,

    /// More than one sub-query
    RouteMulti,

    /// Branch produced its reply
    Answer,
}

impl PipelineEvent {
    /// Event that leaves `Decomposed` for a given branch
    pub fn for_branch(branch: Branch) -> Option<Self> {
        match branch {
            Branch::Single => Some(PipelineEvent::RouteSingle),
            Branch::Multi => Some(PipelineEvent::RouteMulti),
            Branch::NoSearch => None,
        }
    }
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Answered)
    }

    /// Transition function: T: S × Event → Result<S>
    ///
    /// Valid transitions:
    /// 1. Received             → Classified           (Classify)
    /// 2. Classified           → ConversationalBranch (SkipSearch)
    /// 3. Classified           → Decomposed           (Decompose)
    /// 4. Decomposed           → SingleBranch         (RouteSingle)
    /// 5. Decomposed           → MultiBranch          (RouteMulti)
    /// 6. ConversationalBranch → Answered             (Answer)
    /// 7. SingleBranch         → Answered             (Answer)
    /// 8. MultiBranch          → Answered             (Answer)
    /// 9. Answered             → Answered             (terminal)
    pub fn transition(&self, event: PipelineEvent) -> Result<PipelineState> {
        use PipelineEvent::*;
        use PipelineState::*;

        let next_state = match (self, event) {
            (Received, Classify) => Classified,

            (Classified, SkipSearch) => ConversationalBranch,
            (Classified, Decompose) => Decomposed,

            (Decomposed, RouteSingle) => SingleBranch,
            (Decomposed, RouteMulti) => MultiBranch,

            (ConversationalBranch, Answer) => Answered,
            (SingleBranch, Answer) => Answered,
            (MultiBranch, Answer) => Answered,

            (Answered, _) => Answered,

            (from, event) => {
                return Err(RagError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next_state)
    }

    /// Events accepted in this state
    pub fn valid_events(&self) -> Vec<PipelineEvent> {
        use PipelineEvent::*;
        use PipelineState::*;

        match self {
            Received => vec![Classify],
            Classified => vec![SkipSearch, Decompose],
            Decomposed => vec![RouteSingle, RouteMulti],
            ConversationalBranch | SingleBranch | MultiBranch => vec![Answer],
            Answered => Vec::new(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineState::Received => "received",
            PipelineState::Classified => "classified",
            PipelineState::ConversationalBranch => "conversational",
            PipelineState::Decomposed => "decomposed",
            PipelineState::SingleBranch => "single",
            PipelineState::MultiBranch => "multi",
            PipelineState::Answered => "answered",
        }
    }
}
