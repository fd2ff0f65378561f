//! Vector store trait for storing and searching scheme embeddings.

use async_trait::async_trait;

use crate::document::{CollectionInfo, CollectionStatus, EmbeddedDocument, SearchResult};
use crate::error::Result;

/// A storage backend for vector embeddings with cosine similarity search.
///
/// Implementations manage named collections of [`EmbeddedDocument`]s.
/// Point ids are the documents' integer ids; upserting an existing id
/// replaces it.
///
/// # Example
///
/// ```rust,ignore
/// use kisan_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("government_schemes", 768).await?;
/// store.upsert("government_schemes", &points).await?;
/// let results = store.search("government_schemes", &query_vector, 5, 0.5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name used in logs and errors.
    fn backend(&self) -> &'static str;

    /// Create a named collection with cosine distance.
    ///
    /// Returns [`CollectionStatus::AlreadyExists`] without touching the
    /// existing contents if the name is taken.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<CollectionStatus>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Upsert documents and their vectors into a collection in one batch.
    async fn upsert(&self, collection: &str, points: &[EmbeddedDocument]) -> Result<()>;

    /// Return at most `top_k` matches scoring at least `score_threshold`,
    /// ordered by descending score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Describe a collection.
    async fn collection_info(&self, name: &str) -> Result<CollectionInfo>;
}
