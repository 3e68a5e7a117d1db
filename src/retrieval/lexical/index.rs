//! BM25L index artifact
//!
//! Row `i` of the statistical model always corresponds to `ids[i]`; both
//! are produced by [`LexicalIndex::build`] and validated on load.
//!
//! Scoring (Lv & Zhai, BM25L):
//!   idf(t)  = ln((N + 1) / (df(t) + 0.5))
//!   c(t,d)  = tf / (1 - b + b * |d| / avgdl)
//!   s(t,d)  = idf(t) * (k1 + 1) * (c + delta) / (k1 + c + delta)    for tf > 0

use crate::errors::{RagError, Result};
use crate::retrieval::normalizer::tokenize;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Artifact format understood by this build
pub const FORMAT_VERSION: u32 = 1;

/// BM25L parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f64,
    /// Length normalization strength
    pub b: f64,
    /// Lower bound lift for long documents
    pub delta: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            delta: 0.5,
        }
    }
}

/// Immutable BM25L model plus the aligned document identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalIndex {
    #[serde(default)]
    version: u32,
    params: Bm25Params,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<u32>,
    ids: Vec<String>,
    /// Derived from the integer statistics; never persisted
    #[serde(skip)]
    avgdl: f64,
    #[serde(skip)]
    idf: HashMap<String, f64>,
}

impl LexicalIndex {
    /// Build the model over `documents` in corpus order
    pub fn build(documents: &[Document], params: Bm25Params) -> Self {
        let mut term_freqs = Vec::with_capacity(documents.len());
        let mut doc_lens = Vec::with_capacity(documents.len());
        let mut ids = Vec::with_capacity(documents.len());

        for doc in documents {
            let tokens = tokenize(&doc.content.to_lowercase());
            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *freqs.entry(token.clone()).or_insert(0) += 1;
            }

            doc_lens.push(tokens.len() as u32);
            term_freqs.push(freqs);
            ids.push(doc.id().to_string());
        }

        let mut index = Self {
            version: FORMAT_VERSION,
            params,
            term_freqs,
            doc_lens,
            ids,
            avgdl: 0.0,
            idf: HashMap::new(),
        };
        index.derive_statistics();
        index
    }

    /// Recompute `avgdl` and `idf` from term frequencies and lengths.
    ///
    /// Derived floats are never stored, so a loaded index scores
    /// bit-for-bit like the one that was saved.
    fn derive_statistics(&mut self) {
        let mut doc_freq: HashMap<&str, u32> = HashMap::new();
        for freqs in &self.term_freqs {
            for term in freqs.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = self.doc_lens.len() as f64;
        let total_len: u64 = self.doc_lens.iter().map(|&l| u64::from(l)).sum();
        self.avgdl = if self.doc_lens.is_empty() {
            0.0
        } else {
            total_len as f64 / n
        };

        self.idf = doc_freq
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((n + 1.0) / (f64::from(df) + 0.5)).ln()))
            .collect();
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifier of row `row`
    pub fn id(&self, row: usize) -> Option<&str> {
        self.ids.get(row).map(String::as_str)
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Score of every row for the given query tokens
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f64> {
        let Bm25Params { k1, b, delta } = self.params;
        let avgdl = if self.avgdl > 0.0 { self.avgdl } else { 1.0 };
        let mut scores = vec![0.0; self.len()];

        for term in query_tokens {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            for (row, freqs) in self.term_freqs.iter().enumerate() {
                let Some(&tf) = freqs.get(term) else {
                    continue;
                };
                let norm = 1.0 - b + b * f64::from(self.doc_lens[row]) / avgdl;
                let ctd = f64::from(tf) / norm;
                scores[row] += idf * (k1 + 1.0) * (ctd + delta) / (k1 + ctd + delta);
            }
        }

        scores
    }

    /// Top `k` rows by descending score; ties keep corpus order
    pub fn top_k(&self, query_tokens: &[String], k: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> =
            self.scores(query_tokens).into_iter().enumerate().collect();
        // stable sort keeps insertion order among equal scores
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Write the artifact atomically (temp file, then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        let bytes = serde_json::to_vec(self)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Read and validate an artifact written by [`LexicalIndex::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            RagError::IndexUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let mut index: LexicalIndex = serde_json::from_slice(&bytes).map_err(|e| {
            RagError::IndexUnavailable(format!("{}: corrupt artifact: {}", path.display(), e))
        })?;

        if index.version > FORMAT_VERSION {
            return Err(RagError::IndexUnavailable(format!(
                "{}: format version {} is newer than supported {}",
                path.display(),
                index.version,
                FORMAT_VERSION
            )));
        }

        if index.term_freqs.len() != index.ids.len() || index.doc_lens.len() != index.ids.len() {
            return Err(RagError::IndexUnavailable(format!(
                "{}: model rows ({}) and identifiers ({}) are misaligned",
                path.display(),
                index.term_freqs.len(),
                index.ids.len()
            )));
        }

        index.derive_statistics();
        Ok(index)
    }
}
