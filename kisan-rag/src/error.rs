//! Error types for the `kisan-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The named collection does not exist in the store.
    #[error("Collection '{0}' does not exist")]
    CollectionNotFound(String),

    /// A vector did not match the dimensionality of its collection.
    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The collection being written or searched.
        collection: String,
        /// The collection's configured dimensionality.
        expected: usize,
        /// The dimensionality of the offending vector.
        actual: usize,
    },

    /// Reading or parsing a corpus document failed.
    #[error("Corpus error ({path}): {message}")]
    CorpusError {
        /// The file that could not be processed.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An indexing or query operation failed as a whole.
    #[error("Service error: {0}")]
    ServiceError(String),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
