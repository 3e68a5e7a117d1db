//! Query routing and answer orchestration
//!
//! Components:
//! - State machine: typed transitions Received -> ... -> Answered
//! - Selector: precedence among branch replies
//! - Orchestrator: the single `answer(query)` entry point
//! - Builder: assembly from components or configuration

pub mod builder;
pub mod orchestrator;
pub mod selector;
pub mod state;

pub use builder::PipelineBuilder;
pub use orchestrator::PipelineOrchestrator;
pub use selector::ResponseSelector;
pub use state::{PipelineEvent, PipelineState};
