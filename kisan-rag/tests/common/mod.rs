//! Shared test doubles.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use kisan_rag::document::{CollectionInfo, CollectionStatus, EmbeddedDocument, SearchResult};
use kisan_rag::{
    EmbedMode, EmbeddingProvider, InMemoryVectorStore, RagConfig, RagError, RagService, Result,
    VectorStore,
};

pub const DIM: usize = 64;

/// Deterministic bag-of-words embeddings: each lowercase token is hashed
/// into one of `DIM` buckets, then the vector is L2-normalised. Texts that
/// share words get high cosine similarity.
pub struct HashingEmbeddingProvider;

pub fn hash_embed(text: &str) -> Vec<f32> {
    let mut emb = vec![0.0f32; DIM];
    for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
        let hash = token
            .to_lowercase()
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        emb[(hash % DIM as u64) as usize] += 1.0;
    }
    let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        emb.iter_mut().for_each(|x| *x /= norm);
    }
    emb
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
        if text.contains("FAIL") {
            return Err(RagError::EmbeddingError {
                provider: "hashing".to_string(),
                message: "simulated quota error".to_string(),
            });
        }
        Ok(hash_embed(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// A store whose every call fails as if the server were down.
pub struct UnreachableStore;

fn down() -> RagError {
    RagError::VectorStoreError {
        backend: "qdrant".to_string(),
        message: "transport error: connection refused".to_string(),
    }
}

#[async_trait]
impl VectorStore for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }

    async fn create_collection(&self, _name: &str, _dimensions: usize) -> Result<CollectionStatus> {
        Err(down())
    }

    async fn delete_collection(&self, _name: &str) -> Result<()> {
        Err(down())
    }

    async fn upsert(&self, _collection: &str, _points: &[EmbeddedDocument]) -> Result<()> {
        Err(down())
    }

    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _top_k: usize,
        _score_threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        Err(down())
    }

    async fn collection_info(&self, _name: &str) -> Result<CollectionInfo> {
        Err(down())
    }
}

pub fn config() -> RagConfig {
    RagConfig::builder().dimensions(DIM).build().unwrap()
}

pub fn service_with(config: RagConfig, store: Arc<dyn VectorStore>) -> RagService {
    RagService::builder()
        .config(config)
        .embedding_provider(Arc::new(HashingEmbeddingProvider))
        .vector_store(store)
        .build()
        .unwrap()
}

pub fn memory_service() -> RagService {
    service_with(config(), Arc::new(InMemoryVectorStore::new()))
}
