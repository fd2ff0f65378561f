//! Embedding providers and the degrade-to-neutral [`Embedder`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RagError, Result};

/// Which side of retrieval a text is embedded for.
///
/// Documents and queries share one vector space but the hosted model is
/// tuned differently for each; both sides must use the matching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedMode {
    /// A passage being indexed.
    Document,
    /// A user query being searched.
    Query,
}

/// A provider that generates vector embeddings from text input.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends that support
/// native batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, mode).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// The result of embedding one text through an [`Embedder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Embedding {
    /// The provider returned a vector of the expected size.
    Computed(Vec<f32>),
    /// The provider failed; `vector` is all zeros.
    Neutral {
        /// Zero vector of the configured dimensionality.
        vector: Vec<f32>,
        /// Why the provider call failed.
        reason: String,
    },
}

impl Embedding {
    fn neutral(dimensions: usize, reason: String) -> Self {
        Self::Neutral { vector: vec![0.0; dimensions], reason }
    }

    /// Whether the provider call failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Neutral { .. })
    }

    /// The vector, computed or neutral.
    pub fn vector(&self) -> &[f32] {
        match self {
            Self::Computed(vector) | Self::Neutral { vector, .. } => vector,
        }
    }

    /// Consume into the vector, computed or neutral.
    pub fn into_vector(self) -> Vec<f32> {
        match self {
            Self::Computed(vector) | Self::Neutral { vector, .. } => vector,
        }
    }
}

/// Wraps an [`EmbeddingProvider`] and never fails: provider errors and
/// wrongly sized vectors become [`Embedding::Neutral`].
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
}

/// Largest batch sent to the provider in one request.
const MAX_BATCH: usize = 100;

impl Embedder {
    /// Create an embedder producing vectors of `dimensions` length.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, dimensions: usize) -> Self {
        Self { provider, dimensions }
    }

    /// The configured vector dimensionality.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn check(&self, vector: Vec<f32>) -> Embedding {
        if vector.len() == self.dimensions {
            Embedding::Computed(vector)
        } else {
            let reason =
                format!("expected {} dimensions, provider returned {}", self.dimensions, vector.len());
            warn!(%reason, "malformed embedding, using zero vector");
            Embedding::neutral(self.dimensions, reason)
        }
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str, mode: EmbedMode) -> Embedding {
        match self.provider.embed(text, mode).await {
            Ok(vector) => self.check(vector),
            Err(e) => {
                warn!(?mode, error = %e, "embedding failed, using zero vector");
                Embedding::neutral(self.dimensions, e.to_string())
            }
        }
    }

    /// Embed many texts, batching requests to the provider.
    ///
    /// When a batch request fails, its items are retried one at a time so
    /// each failure is attributed to the text that caused it.
    pub async fn embed_all(&self, texts: &[&str], mode: EmbedMode) -> Vec<Embedding> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            match self.provider.embed_batch(batch, mode).await {
                Ok(vectors) if vectors.len() == batch.len() => {
                    out.extend(vectors.into_iter().map(|v| self.check(v)));
                }
                outcome => {
                    let detail = match outcome {
                        Err(e) => e.to_string(),
                        Ok(v) => format!("expected {} vectors, got {}", batch.len(), v.len()),
                    };
                    warn!(batch_size = batch.len(), error = %detail, "batch embedding failed, retrying per item");
                    for text in batch {
                        out.push(self.embed(text, mode).await);
                    }
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder").field("dimensions", &self.dimensions).finish_non_exhaustive()
    }
}

/// Build an [`RagError::EmbeddingError`] for the named provider.
pub(crate) fn embedding_error(provider: &str, message: impl Into<String>) -> RagError {
    RagError::EmbeddingError { provider: provider.to_string(), message: message.into() }
}
