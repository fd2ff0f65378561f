//! Configuration for chunking, embedding, and search.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default vector dimensionality of the hosted embedding model.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// What to do with a document whose embedding could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFailurePolicy {
    /// Index the document with a zero vector. It stays in the collection
    /// but never ranks above a positive score threshold.
    #[default]
    ZeroVector,
    /// Leave the document out of the batch.
    Skip,
    /// Fail the whole batch without writing anything.
    Abort,
}

/// Configuration parameters for indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Minimum similarity for ad-hoc service searches.
    pub search_threshold: f32,
    /// Minimum similarity used by the retrieval tool.
    pub tool_threshold: f32,
    /// Embedding vector dimensionality.
    pub dimensions: usize,
    /// Handling of per-document embedding failures during indexing.
    pub failure_policy: EmbeddingFailurePolicy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 100,
            top_k: 5,
            search_threshold: 0.6,
            tool_threshold: 0.5,
            dimensions: DEFAULT_DIMENSIONS,
            failure_policy: EmbeddingFailurePolicy::ZeroVector,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the default threshold for ad-hoc searches.
    pub fn search_threshold(mut self, threshold: f32) -> Self {
        self.config.search_threshold = threshold;
        self
    }

    /// Set the default threshold for the retrieval tool.
    pub fn tool_threshold(mut self, threshold: f32) -> Self {
        self.config.tool_threshold = threshold;
        self
    }

    /// Set the embedding dimensionality.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Set the embedding failure policy.
    pub fn failure_policy(mut self, policy: EmbeddingFailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0` or `dimensions == 0`
    /// - either threshold lies outside `[0, 1]`
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if config.dimensions == 0 {
            return Err(RagError::ConfigError("dimensions must be greater than zero".to_string()));
        }
        for (name, value) in
            [("search_threshold", config.search_threshold), ("tool_threshold", config.tool_threshold)]
        {
            if !(0.0..=1.0).contains(&value) {
                return Err(RagError::ConfigError(format!("{name} ({value}) must be within [0, 1]")));
            }
        }
        Ok(config)
    }
}
