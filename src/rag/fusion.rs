//! Reciprocal rank fusion: score(d) = Σ 1 / (rank_i(d) + C)
//!
//! Lexical and semantic scores live on unrelated scales, so lists are
//! merged by rank position only. Ranks are 0-indexed.

use crate::types::{Document, RankedDocumentList};
use std::collections::{HashMap, HashSet};

/// Default smoothing constant
pub const DEFAULT_RRF_CONSTANT: u32 = 60;

/// Rank fuser
#[derive(Debug, Clone, Copy)]
pub struct RankFuser {
    constant: u32,
}

impl RankFuser {
    /// `constant` dampens the weight of rank 0; values below 1 are raised to 1
    pub fn new(constant: u32) -> Self {
        Self {
            constant: constant.max(1),
        }
    }

    pub fn constant(&self) -> u32 {
        self.constant
    }

    /// Contribution of a document at 0-indexed `rank`
    pub fn contribution(&self, rank: usize) -> f64 {
        1.0 / (rank as f64 + f64::from(self.constant))
    }

    /// Merge `lists` into the top `k` documents by fused score.
    ///
    /// Each identifier appears once in the output. Ties keep first-seen
    /// order across lists. A repeated identifier inside one list only
    /// counts at its first position.
    pub fn fuse(&self, lists: &[RankedDocumentList], k: usize) -> RankedDocumentList {
        let mut fused: Vec<(Document, f64)> = Vec::new();
        let mut position: HashMap<String, usize> = HashMap::new();

        for list in lists {
            let mut seen_in_list = HashSet::new();
            for (rank, doc) in list.iter().enumerate() {
                if !seen_in_list.insert(doc.id()) {
                    continue;
                }
                let contribution = self.contribution(rank);
                match position.get(doc.id()) {
                    Some(&slot) => fused[slot].1 += contribution,
                    None => {
                        position.insert(doc.id().to_string(), fused.len());
                        fused.push((doc.clone(), contribution));
                    }
                }
            }
        }

        // stable: equal scores stay in first-seen order
        fused.sort_by(|a, b| b.1.total_cmp(&a.1));
        fused.truncate(k);

        fused
            .into_iter()
            .map(|(doc, score)| doc.with_score(score))
            .collect()
    }
}

impl Default for RankFuser {
    fn default() -> Self {
        Self::new(DEFAULT_RRF_CONSTANT)
    }
}
