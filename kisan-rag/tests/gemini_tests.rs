//! Gemini embedding provider against a mock HTTP server.
#![cfg(feature = "gemini")]

use std::sync::Arc;

use kisan_rag::gemini::GeminiEmbeddingProvider;
use kisan_rag::{EmbedMode, Embedder, EmbeddingProvider};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> GeminiEmbeddingProvider {
    GeminiEmbeddingProvider::new("test-key")
        .unwrap()
        .with_dimensions(3)
        .with_base_url(&server.uri())
        .unwrap()
}

#[tokio::test]
async fn query_embedding_uses_retrieval_query_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/embedding-001:embedContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "model": "models/embedding-001",
            "taskType": "RETRIEVAL_QUERY",
            "content": { "parts": [{ "text": "PM Kisan eligibility" }] }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embedding": { "values": [0.1, 0.2, 0.3] } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let vector = provider(&server).embed("PM Kisan eligibility", EmbedMode::Query).await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn batch_embedding_uses_retrieval_document_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/embedding-001:batchEmbedContents"))
        .and(body_partial_json(json!({
            "requests": [
                { "taskType": "RETRIEVAL_DOCUMENT", "content": { "parts": [{ "text": "a" }] } },
                { "taskType": "RETRIEVAL_DOCUMENT", "content": { "parts": [{ "text": "b" }] } }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [ { "values": [1.0, 0.0, 0.0] }, { "values": [0.0, 1.0, 0.0] } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vectors =
        provider(&server).embed_batch(&["a", "b"], EmbedMode::Document).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/embedding-001:embedContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let err = provider(&server).embed("x", EmbedMode::Document).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("429"), "{message}");
    assert!(message.contains("Resource has been exhausted"), "{message}");
}

#[tokio::test]
async fn failed_batch_falls_back_to_single_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/embedding-001:batchEmbedContents"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/embedding-001:embedContent"))
        .and(body_partial_json(json!({ "content": { "parts": [{ "text": "good" }] } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embedding": { "values": [0.0, 0.0, 1.0] } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/embedding-001:embedContent"))
        .and(body_partial_json(json!({ "content": { "parts": [{ "text": "bad" }] } })))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let embedder = Embedder::new(Arc::new(provider(&server)), 3);
    let embeddings = embedder.embed_all(&["good", "bad"], EmbedMode::Document).await;

    assert_eq!(embeddings.len(), 2);
    assert!(!embeddings[0].is_degraded());
    assert_eq!(embeddings[0].vector(), &[0.0, 0.0, 1.0]);
    assert!(embeddings[1].is_degraded());
    assert_eq!(embeddings[1].vector(), &[0.0, 0.0, 0.0]);
}

#[tokio::test]
async fn wrong_length_vector_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/embedding-001:embedContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embedding": { "values": [0.5] } })),
        )
        .mount(&server)
        .await;

    let embedder = Embedder::new(Arc::new(provider(&server)), 3);
    let embedding = embedder.embed("short", EmbedMode::Query).await;
    assert!(embedding.is_degraded());
    assert_eq!(embedding.vector().len(), 3);
}
