//! Qdrant-backed semantic store
//!
//! Points carry the chunk text under the `content` payload key and the
//! corpus identifier under `doc_id`; every other scalar payload entry is
//! surfaced as document metadata.

use crate::errors::{RagError, Result};
use crate::retrieval::semantic::{Embedder, SemanticStore};
use crate::types::{Document, RankedDocumentList};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, PointId, ScrollPointsBuilder, SearchPointsBuilder,
    Value as QdrantValue,
};
use qdrant_client::Qdrant;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Page size used when scrolling the whole collection
const SCROLL_PAGE: u32 = 256;

const CONTENT_KEYS: [&str; 2] = ["content", "document"];
const ID_KEY: &str = "doc_id";

/// Vector store over one Qdrant collection
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl QdrantStore {
    /// Connect to `url`; the collection is expected to exist
    pub fn connect(url: &str, collection: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| RagError::RetrievalUnavailable(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            embedder,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of points in the collection
    pub async fn count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(self.collection.clone())
            .await
            .map_err(|e| RagError::RetrievalUnavailable(format!("Failed to get collection info: {}", e)))?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }
}

#[async_trait]
impl SemanticStore for QdrantStore {
    async fn search(&self, query: &str, k: usize) -> Result<RankedDocumentList> {
        let vector = self.embedder.embed(query).await?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, k as u64).with_payload(true),
            )
            .await
            .map_err(|e| RagError::RetrievalUnavailable(format!("Failed to search points: {}", e)))?;

        let documents = response
            .result
            .into_iter()
            .map(|point| {
                to_document(point.id.as_ref(), point.payload).with_score(f64::from(point.score))
            })
            .collect();

        Ok(documents)
    }

    async fn all_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut request = ScrollPointsBuilder::new(&self.collection)
                .limit(SCROLL_PAGE)
                .with_payload(true);
            if let Some(from) = offset.take() {
                request = request.offset(from);
            }

            let page = self
                .client
                .scroll(request)
                .await
                .map_err(|e| RagError::RetrievalUnavailable(format!("Failed to scroll points: {}", e)))?;

            documents.extend(
                page.result
                    .into_iter()
                    .map(|point| to_document(point.id.as_ref(), point.payload)),
            );

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(collection = %self.collection, documents = documents.len(), "scrolled collection");
        Ok(documents)
    }
}

fn to_document(point_id: Option<&PointId>, payload: HashMap<String, QdrantValue>) -> Document {
    let content = CONTENT_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(qdrant_value_to_string))
        .unwrap_or_default();

    let id = payload
        .get(ID_KEY)
        .and_then(qdrant_value_to_string)
        .unwrap_or_else(|| point_id_to_string(point_id));

    payload
        .into_iter()
        .filter(|(key, _)| key != ID_KEY && !CONTENT_KEYS.contains(&key.as_str()))
        .filter_map(|(key, value)| qdrant_to_json_value(&value).map(|json| (key, json)))
        .fold(Document::new(id, content), |doc, (key, value)| {
            doc.with_metadata(key, value)
        })
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
        Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
        Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
        Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
        _ => None,
    })
}

fn qdrant_value_to_string(value: &QdrantValue) -> Option<String> {
    match value.kind.as_ref() {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn point_id_to_string(point_id: Option<&PointId>) -> String {
    match point_id.and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => "unknown".to_string(),
    }
}
