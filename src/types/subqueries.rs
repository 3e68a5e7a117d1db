//! Non-empty list of sub-queries produced by decomposition

use serde::{Deserialize, Serialize};

/// Ordered sub-queries; never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubqueryList(Vec<String>);

impl SubqueryList {
    /// The original query as its own single sub-query
    pub fn single(query: impl Into<String>) -> Self {
        Self(vec![query.into()])
    }

    /// Keep non-blank `parts`; falls back to `original` when none remain
    pub fn from_parts(original: &str, parts: impl IntoIterator<Item = String>) -> Self {
        let parts: Vec<String> = parts
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            Self::single(original)
        } else {
            Self(parts)
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}
