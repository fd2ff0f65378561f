//! Data types for documents, indexed points, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source label used when a document does not name its origin.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// A passage of scheme text ready for indexing.
///
/// During corpus preparation every chunk of a source file becomes one
/// `Document`. The `id` is unique within a collection and doubles as the
/// vector store point id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Point identity within the collection.
    pub id: u64,
    /// The passage text.
    pub text: String,
    /// Originating file name.
    #[serde(default = "default_source")]
    pub source: String,
    /// Chunk position and any other key/value pairs.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

fn default_source() -> String {
    UNKNOWN_SOURCE.to_string()
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: u64, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { id, text: text.into(), source: source.into(), metadata: HashMap::new() }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A [`Document`] paired with its embedding vector, as written to a store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedDocument {
    /// The indexed document.
    pub document: Document,
    /// The document-mode embedding.
    pub embedding: Vec<f32>,
}

/// A retrieved document with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Point identity of the match.
    pub id: u64,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
    /// The matched passage text.
    pub text: String,
    /// Originating file name.
    pub source: String,
    /// Metadata stored with the passage.
    pub metadata: HashMap<String, Value>,
}

impl SearchResult {
    /// Build a result from a stored document and its score.
    pub fn from_document(document: &Document, score: f32) -> Self {
        Self {
            id: document.id,
            score,
            text: document.text.clone(),
            source: document.source.clone(),
            metadata: document.metadata.clone(),
        }
    }
}

/// Outcome of an idempotent collection creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// The collection was newly created.
    Created,
    /// A collection with the same name already existed and was left untouched.
    AlreadyExists,
}

/// Administrative summary of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Number of stored points.
    pub points_count: u64,
    /// Number of indexed vectors, when the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectors_count: Option<u64>,
    /// Configured vector dimensionality, when the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    /// Backend-specific health status (e.g. `green`).
    pub status: String,
}
