//! Cross-encoder served over HTTP (text-embeddings-inference `/rerank`)

use crate::config::RerankerConfig;
use crate::errors::{RagError, Result};
use crate::rag::reranking::RelevanceScorer;
use crate::types::Document;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const RERANK_TIMEOUT: Duration = Duration::from_secs(60);

/// Remote cross-encoder
#[derive(Debug, Clone)]
pub struct HttpCrossEncoder {
    client: Client,
    url: String,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    score: f64,
}

impl HttpCrossEncoder {
    pub fn new(url: &str, model: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(RERANK_TIMEOUT)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// `None` when no service url is configured
    pub fn from_config(config: &RerankerConfig) -> Result<Option<Self>> {
        match config.url.as_deref() {
            Some(url) if !url.trim().is_empty() => Self::new(url, config.model.clone()).map(Some),
            _ => Ok(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Put service hits back into input order
fn align_scores(hits: Vec<RerankHit>, expected: usize) -> Result<Vec<f64>> {
    let mut scores = vec![None; expected];
    for hit in hits {
        let slot = scores.get_mut(hit.index).ok_or_else(|| {
            RagError::RerankFailure(format!("Reranker returned out-of-range index {}", hit.index))
        })?;
        *slot = Some(hit.score);
    }

    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.ok_or_else(|| RagError::RerankFailure(format!("No score for document {}", i))))
        .collect()
}

#[async_trait]
impl RelevanceScorer for HttpCrossEncoder {
    async fn score(&self, query: &str, documents: &[Document]) -> Result<Vec<f64>> {
        let request = RerankRequest {
            query,
            texts: documents.iter().map(|d| d.content.as_str()).collect(),
            model: self.model.as_deref(),
            truncate: true,
        };

        let response = self
            .client
            .post(format!("{}/rerank", self.url))
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::RerankFailure(format!("Rerank request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RagError::RerankFailure(format!(
                "Rerank service returned HTTP {}",
                response.status()
            )));
        }

        let hits: Vec<RerankHit> = response
            .json()
            .await
            .map_err(|e| RagError::RerankFailure(format!("Malformed rerank response: {}", e)))?;

        align_scores(hits, documents.len())
    }

    fn name(&self) -> &str {
        "cross-encoder"
    }
}
