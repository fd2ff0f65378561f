//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps collections in a `HashMap` behind a
//! `tokio::sync::RwLock`. Contents do not survive a restart; it backs
//! tests and the fallback used when no Qdrant server is reachable.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{CollectionInfo, CollectionStatus, EmbeddedDocument, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

#[derive(Debug, Default)]
struct Collection {
    dimensions: usize,
    points: BTreeMap<u64, EmbeddedDocument>,
}

/// An in-memory vector store using cosine similarity for search.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn check_dimensions(collection: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RagError::DimensionMismatch {
            collection: collection.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<CollectionStatus> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Ok(CollectionStatus::AlreadyExists);
        }
        collections.insert(name.to_string(), Collection { dimensions, points: BTreeMap::new() });
        Ok(CollectionStatus::Created)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RagError::CollectionNotFound(name.to_string()))
    }

    async fn upsert(&self, collection: &str, points: &[EmbeddedDocument]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
        // Validate the whole batch before writing any of it.
        for point in points {
            check_dimensions(collection, store.dimensions, point.embedding.len())?;
        }
        for point in points {
            store.points.insert(point.document.id, point.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections
            .get(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
        check_dimensions(collection, store.dimensions, embedding.len())?;

        let mut scored: Vec<SearchResult> = store
            .points
            .values()
            .map(|point| {
                SearchResult::from_document(
                    &point.document,
                    cosine_similarity(&point.embedding, embedding),
                )
            })
            .filter(|r| r.score >= score_threshold)
            .collect();

        // BTreeMap iteration is by id, and the sort is stable, so ties keep ascending ids.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let collections = self.collections.read().await;
        let store =
            collections.get(name).ok_or_else(|| RagError::CollectionNotFound(name.to_string()))?;
        let count = store.points.len() as u64;
        Ok(CollectionInfo {
            name: name.to_string(),
            points_count: count,
            vectors_count: Some(count),
            dimensions: Some(store.dimensions),
            status: "green".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn point(id: u64, embedding: Vec<f32>) -> EmbeddedDocument {
        EmbeddedDocument { document: Document::new(id, format!("text {id}"), "s.pdf"), embedding }
    }

    #[tokio::test]
    async fn create_is_idempotent_and_keeps_contents() {
        let store = InMemoryVectorStore::new();
        assert_eq!(store.create_collection("c", 2).await.unwrap(), CollectionStatus::Created);
        store.upsert("c", &[point(1, vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(store.create_collection("c", 2).await.unwrap(), CollectionStatus::AlreadyExists);
        assert_eq!(store.collection_info("c").await.unwrap().points_count, 1);
    }

    #[tokio::test]
    async fn recreated_collection_starts_empty() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[point(1, vec![1.0, 0.0])]).await.unwrap();
        store.delete_collection("c").await.unwrap();
        assert!(matches!(store.collection_info("c").await, Err(RagError::CollectionNotFound(_))));
        store.create_collection("c", 2).await.unwrap();
        assert_eq!(store.collection_info("c").await.unwrap().points_count, 0);
    }

    #[tokio::test]
    async fn zero_vector_never_passes_positive_threshold() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[point(1, vec![0.0, 0.0]), point(2, vec![1.0, 0.0])]).await.unwrap();
        let results = store.search("c", &[1.0, 0.0], 5, 0.1).await.unwrap();
        assert_eq!(results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn dimension_mismatch_rejects_batch() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        let err = store
            .upsert("c", &[point(1, vec![1.0, 0.0]), point(2, vec![1.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 1, .. }));
        assert_eq!(store.collection_info("c").await.unwrap().points_count, 0);
    }

    #[tokio::test]
    async fn empty_collection_search_is_empty() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        assert!(store.search("c", &[1.0, 0.0], 5, 0.0).await.unwrap().is_empty());
    }
}
