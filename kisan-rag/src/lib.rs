//! # kisan-rag
//!
//! Retrieval over government agricultural scheme documents for the
//! KisanVaani farming assistant.
//!
//! ## Overview
//!
//! - [`chunking`]: split raw document text into overlapping passages
//! - [`embedding`]: hosted embedding providers and the degrade-to-neutral [`Embedder`]
//! - [`vectorstore`]: the [`VectorStore`] trait with in-memory and Qdrant backends
//! - [`service`]: [`RagService`], which embeds, indexes, and searches documents
//! - [`tool`]: [`RetrievalTool`], the agent-facing function that always returns text
//! - [`corpus`]: PDF extraction and document building for indexing runs
//! - [`settings`]: environment configuration and startup wiring
//!
//! ## Features
//!
//! - `gemini` (default): Gemini embedding provider over HTTPS
//! - `qdrant`: Qdrant vector store over gRPC
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kisan_rag::{RetrievalTool, RagConfig, StoreSettings, connect};
//!
//! let settings = StoreSettings::from_env()?;
//! let availability = connect(&settings, RagConfig::default()).await;
//! let tool = RetrievalTool::new(availability, &settings.collection);
//! println!("{}", tool.retrieve_default("PM Kisan eligibility criteria").await);
//! ```

pub mod chunking;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod service;
pub mod settings;
pub mod tool;
pub mod vectorstore;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{BoundaryChunker, Chunker, chunk_spans, chunk_text};
pub use config::{DEFAULT_DIMENSIONS, EmbeddingFailurePolicy, RagConfig, RagConfigBuilder};
pub use corpus::{CorpusReport, FileReport, SkippedFile, extract_pdf_text, prepare_corpus};
pub use document::{CollectionInfo, CollectionStatus, Document, EmbeddedDocument, SearchResult};
pub use embedding::{EmbedMode, Embedder, Embedding, EmbeddingProvider};
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use service::{IngestReport, RagService, RagServiceBuilder};
pub use settings::{DEFAULT_COLLECTION, StoreMode, StoreSettings, connect, connect_with};
pub use tool::{DEFAULT_PORTAL, RetrievalTool, StoreAvailability, UNAVAILABLE_MESSAGE};
pub use vectorstore::VectorStore;
