//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//! Each point carries the payload `{text, source, metadata}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use kisan_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334", None)?;
//! store.create_collection("government_schemes", 768).await?;
//! let results = store.search("government_schemes", &query_vector, 5, 0.6).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CollectionStatus as QdrantCollectionStatus, CreateCollectionBuilder, Distance, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::document::{
    CollectionInfo, CollectionStatus, EmbeddedDocument, SearchResult, UNKNOWN_SOURCE,
};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Create a store for the given gRPC URL, with an API key for hosted clusters.
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a store for a local server at `host:port`.
    pub fn local(host: &str, port: u16) -> Result<Self> {
        Self::new(&format!("http://{host}:{port}"), None)
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    /// Check that the server answers.
    pub async fn health_check(&self) -> Result<()> {
        self.client.health_check().await.map_err(Self::map_err)?;
        Ok(())
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStoreError { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn payload(point: &EmbeddedDocument) -> Result<Payload> {
        let document = &point.document;
        let metadata: Map<String, Value> =
            document.metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let value = json!({
            "text": document.text,
            "source": document.source,
            "metadata": Value::Object(metadata),
        });
        payload_from(value)
    }
}

/// Convert a JSON object into a point payload.
fn payload_from(value: Value) -> Result<Payload> {
    Payload::try_from(value).map_err(|e| RagError::VectorStoreError {
        backend: "qdrant".to_string(),
        message: format!("invalid point payload: {e}"),
    })
}

/// Convert a Qdrant payload value back into JSON.
fn to_json(value: &QdrantValue) -> Value {
    match &value.kind {
        Some(Kind::NullValue(_)) | None => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => Value::from(*i),
        Some(Kind::DoubleValue(d)) => Value::from(*d),
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::ListValue(list)) => Value::Array(list.values.iter().map(to_json).collect()),
        Some(Kind::StructValue(s)) => {
            Value::Object(s.fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
        }
    }
}

fn extract_string(value: &QdrantValue) -> Option<String> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn backend(&self) -> &'static str {
        "qdrant"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<CollectionStatus> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        let exists = collections.collections.iter().any(|c| c.name == name);
        if exists {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(CollectionStatus::AlreadyExists);
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(CollectionStatus::Created)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[EmbeddedDocument]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let structs = points
            .iter()
            .map(|point| {
                Ok(PointStruct::new(point.document.id, point.embedding.clone(), Self::payload(point)?))
            })
            .collect::<Result<Vec<PointStruct>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, structs).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = points.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
                    .score_threshold(score_threshold)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .filter_map(|scored| {
                let id = match scored.id.as_ref().and_then(|pid| pid.point_id_options.as_ref()) {
                    Some(PointIdOptions::Num(n)) => *n,
                    other => {
                        warn!(collection, id = ?other, "skipping point without integer id");
                        return None;
                    }
                };

                let text = scored.payload.get("text").and_then(extract_string).unwrap_or_default();
                let source = scored
                    .payload
                    .get("source")
                    .and_then(extract_string)
                    .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
                let metadata: HashMap<String, Value> = scored
                    .payload
                    .get("metadata")
                    .and_then(|v| match &v.kind {
                        Some(Kind::StructValue(s)) => {
                            Some(s.fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
                        }
                        _ => None,
                    })
                    .unwrap_or_default();

                Some(SearchResult { id, score: scored.score, text, source, metadata })
            })
            .collect();

        Ok(results)
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let response = self.client.collection_info(name).await.map_err(Self::map_err)?;
        let info = response.result.ok_or_else(|| RagError::CollectionNotFound(name.to_string()))?;

        let dimensions = info
            .config
            .as_ref()
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|v| match &v.config {
                Some(VectorsConfigKind::Params(params)) => Some(params.size as usize),
                _ => None,
            });
        let status = QdrantCollectionStatus::try_from(info.status)
            .map(|s| s.as_str_name().to_ascii_lowercase())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(CollectionInfo {
            name: name.to_string(),
            points_count: info.points_count.unwrap_or_default(),
            vectors_count: info.indexed_vectors_count,
            dimensions,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn payload_carries_text_source_and_metadata() {
        let point = EmbeddedDocument {
            document: Document::new(7, "PM Kisan", "pm_kisan.pdf").with_metadata("chunk_index", 0),
            embedding: vec![0.1, 0.2],
        };
        let payload = QdrantVectorStore::payload(&point).unwrap();
        let map: HashMap<String, QdrantValue> = payload.into();
        assert_eq!(map.get("text").and_then(extract_string).as_deref(), Some("PM Kisan"));
        assert_eq!(map.get("source").and_then(extract_string).as_deref(), Some("pm_kisan.pdf"));
        let metadata = map.get("metadata").map(to_json).unwrap_or_default();
        assert_eq!(metadata["chunk_index"], 0);
    }

    #[test]
    fn non_object_payload_is_a_store_error() {
        let Err(err) = payload_from(json!(["not", "an", "object"])) else {
            panic!("an array cannot become a payload");
        };
        assert!(matches!(err, RagError::VectorStoreError { ref backend, .. } if backend == "qdrant"));
        assert!(err.to_string().contains("invalid point payload"));
    }
}
