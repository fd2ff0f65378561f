//! The vector store client used by indexing and retrieval.
//!
//! [`RagService`] composes an [`Embedder`] and a [`VectorStore`]: documents
//! are embedded in document mode and upserted as one batch, queries are
//! embedded in query mode and searched with a score threshold.
//!
//! # Example
//!
//! ```rust,ignore
//! use kisan_rag::{RagService, RagConfig, InMemoryVectorStore};
//!
//! let service = RagService::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! service.create_collection("government_schemes").await?;
//! service.add_documents(&documents, "government_schemes").await?;
//! let results = service.search("PM Kisan eligibility", "government_schemes", 5, 0.6).await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{EmbeddingFailurePolicy, RagConfig};
use crate::document::{CollectionInfo, CollectionStatus, Document, EmbeddedDocument, SearchResult};
use crate::embedding::{EmbedMode, Embedder, Embedding, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// What happened to each document in an [`RagService::add_documents`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Number of points written to the store.
    pub indexed: usize,
    /// Ids written with a zero vector because embedding failed.
    pub degraded: Vec<u64>,
    /// Ids left out because embedding failed.
    pub skipped: Vec<u64>,
}

impl IngestReport {
    /// Whether every document was embedded successfully.
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty() && self.skipped.is_empty()
    }
}

/// Embeds, indexes, and searches scheme documents.
///
/// Construct one via [`RagService::builder()`]. One instance is built at
/// startup and shared behind an `Arc`.
pub struct RagService {
    config: RagConfig,
    embedder: Embedder,
    vector_store: Arc<dyn VectorStore>,
}

impl RagService {
    /// Create a new [`RagServiceBuilder`].
    pub fn builder() -> RagServiceBuilder {
        RagServiceBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create a named collection with the configured dimensionality.
    ///
    /// Calling this for an existing collection reports
    /// [`CollectionStatus::AlreadyExists`] and leaves its contents alone.
    pub async fn create_collection(&self, name: &str) -> Result<CollectionStatus> {
        let status =
            self.vector_store.create_collection(name, self.config.dimensions).await.map_err(|e| {
                error!(collection = name, error = %e, "failed to create collection");
                e
            })?;
        match status {
            CollectionStatus::Created => info!(collection = name, "created collection"),
            CollectionStatus::AlreadyExists => info!(collection = name, "collection already exists"),
        }
        Ok(status)
    }

    /// Delete a named collection.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.vector_store.delete_collection(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
            e
        })?;
        info!(collection = name, "deleted collection");
        Ok(())
    }

    /// Describe a collection.
    pub async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        self.vector_store.collection_info(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to get collection info");
            e
        })
    }

    /// Embed every document (document mode) and upsert them in one batch.
    ///
    /// Embedding failures are handled per the configured
    /// [`EmbeddingFailurePolicy`] and listed in the returned report.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ServiceError`] under [`EmbeddingFailurePolicy::Abort`]
    /// when any embedding fails, or the store's error if the upsert fails.
    pub async fn add_documents(
        &self,
        documents: &[Document],
        collection: &str,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        if documents.is_empty() {
            return Ok(report);
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let embeddings = self.embedder.embed_all(&texts, EmbedMode::Document).await;

        let mut points = Vec::with_capacity(documents.len());
        for (document, embedding) in documents.iter().zip(embeddings) {
            if let Embedding::Neutral { reason, .. } = &embedding {
                match self.config.failure_policy {
                    EmbeddingFailurePolicy::ZeroVector => {
                        warn!(document.id = document.id, %reason, "indexing document with zero vector");
                        report.degraded.push(document.id);
                    }
                    EmbeddingFailurePolicy::Skip => {
                        warn!(document.id = document.id, %reason, "skipping document");
                        report.skipped.push(document.id);
                        continue;
                    }
                    EmbeddingFailurePolicy::Abort => {
                        error!(document.id = document.id, %reason, "embedding failed, aborting batch");
                        return Err(RagError::ServiceError(format!(
                            "embedding failed for document {}: {reason}",
                            document.id
                        )));
                    }
                }
            }
            points.push(EmbeddedDocument {
                document: document.clone(),
                embedding: embedding.into_vector(),
            });
        }

        self.vector_store.upsert(collection, &points).await.map_err(|e| {
            error!(collection, error = %e, "upsert failed");
            e
        })?;

        report.indexed = points.len();
        info!(
            collection,
            indexed = report.indexed,
            degraded = report.degraded.len(),
            skipped = report.skipped.len(),
            "added documents"
        );
        Ok(report)
    }

    /// Search a collection for passages similar to `query`.
    ///
    /// Returns at most `top_k` results scoring at least `score_threshold`,
    /// by descending score. If the query cannot be embedded the result is
    /// empty rather than a ranking against a zero vector.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the search itself fails.
    pub async fn search(
        &self,
        query: &str,
        collection: &str,
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = match self.embedder.embed(query, EmbedMode::Query).await {
            Embedding::Computed(vector) => vector,
            Embedding::Neutral { reason, .. } => {
                warn!(collection, %reason, "query embedding failed, returning no results");
                return Ok(Vec::new());
            }
        };

        let mut results = self
            .vector_store
            .search(collection, &vector, top_k, score_threshold)
            .await
            .map_err(|e| {
                error!(collection, backend = self.vector_store.backend(), error = %e, "search failed");
                e
            })?;

        // Enforce top_k and threshold for every backend.
        results.retain(|r| r.score >= score_threshold);
        results.truncate(top_k);

        info!(collection, result_count = results.len(), "search completed");
        Ok(results)
    }

    /// Search with the configured `top_k` and ad-hoc threshold.
    pub async fn search_default(&self, query: &str, collection: &str) -> Result<Vec<SearchResult>> {
        self.search(query, collection, self.config.top_k, self.config.search_threshold).await
    }
}

/// Builder for constructing a [`RagService`].
///
/// `embedding_provider` and `vector_store` are required; `config` defaults
/// to [`RagConfig::default()`].
#[derive(Default)]
pub struct RagServiceBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
}

impl RagServiceBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Build the [`RagService`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// provider's dimensionality disagrees with the configuration.
    pub fn build(self) -> Result<RagService> {
        let config = self.config.unwrap_or_default();
        let provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;

        if provider.dimensions() != config.dimensions {
            return Err(RagError::ConfigError(format!(
                "embedding provider produces {} dimensions but config expects {}",
                provider.dimensions(),
                config.dimensions
            )));
        }

        let embedder = Embedder::new(provider, config.dimensions);
        Ok(RagService { config, embedder, vector_store })
    }
}
