//! Type definitions module
//!
//! Typed records passed between pipeline stages.

pub mod document;
pub mod messages;
pub mod result;
pub mod subqueries;

// Re-export commonly used types
pub use document::{Document, RankedDocumentList};
pub use messages::{ChatMessage, Role};
pub use result::{Branch, PipelineResult};
pub use subqueries::SubqueryList;
