//! Gemini embedding provider over the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::DEFAULT_DIMENSIONS;
use crate::embedding::{EmbedMode, EmbeddingProvider, embedding_error};
use crate::error::Result;

/// The default Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// The default embedding model.
pub const DEFAULT_MODEL: &str = "models/embedding-001";

const PROVIDER: &str = "Gemini";

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` and
/// `batchEmbedContents` endpoints.
///
/// [`EmbedMode::Document`] maps to the `RETRIEVAL_DOCUMENT` task type and
/// [`EmbedMode::Query`] to `RETRIEVAL_QUERY`.
///
/// # Example
///
/// ```rust,ignore
/// use kisan_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("PM Kisan eligibility", EmbedMode::Query).await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
    model: String,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(embedding_error(PROVIDER, "API key must not be empty"));
        }
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| embedding_error(PROVIDER, format!("invalid base URL: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model: DEFAULT_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a new provider using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| embedding_error(PROVIDER, "GOOGLE_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Set the model identifier. A bare name gets the `models/` prefix.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = if model.starts_with("models/") { model } else { format!("models/{model}") };
        self
    }

    /// Set the expected output dimensionality.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Point the provider at a different API root (used for proxies and tests).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let normalized =
            if base_url.ends_with('/') { base_url.to_string() } else { format!("{base_url}/") };
        self.base_url = Url::parse(&normalized)
            .map_err(|e| embedding_error(PROVIDER, format!("invalid base URL: {e}")))?;
        Ok(self)
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, method: &str) -> Result<Url> {
        self.base_url
            .join(&format!("{}:{method}", self.model))
            .map_err(|e| embedding_error(PROVIDER, format!("invalid endpoint: {e}")))
    }

    fn request<'a>(&'a self, text: &'a str, mode: EmbedMode) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.model,
            content: Content { parts: vec![Part { text }] },
            task_type: TaskType::from(mode),
        }
    }

    async fn post<Req: Serialize, Res: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        body: &Req,
    ) -> Result<Res> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                embedding_error(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(embedding_error(PROVIDER, format!("API returned {status}: {detail}")));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            embedding_error(PROVIDER, format!("failed to parse response: {e}"))
        })
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

impl From<EmbedMode> for TaskType {
    fn from(mode: EmbedMode) -> Self {
        match mode {
            EmbedMode::Document => Self::RetrievalDocument,
            EmbedMode::Query => Self::RetrievalQuery,
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), ?mode, "embedding single text");

        let url = self.endpoint("embedContent")?;
        let response: EmbedContentResponse = self.post(url, &self.request(text, mode)).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let url = self.endpoint("batchEmbedContents")?;
        let body = BatchEmbedContentsRequest {
            requests: texts.iter().map(|text| self.request(text, mode)).collect(),
        };
        let response: BatchEmbedContentsResponse = self.post(url, &body).await?;

        if response.embeddings.len() != texts.len() {
            return Err(embedding_error(
                PROVIDER,
                format!("expected {} embeddings, got {}", texts.len(), response.embeddings.len()),
            ));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        assert!(GeminiEmbeddingProvider::new("").is_err());
    }

    #[test]
    fn model_gets_prefix_and_endpoint() {
        let provider = GeminiEmbeddingProvider::new("key").unwrap().with_model("text-embedding-004");
        assert_eq!(provider.model(), "models/text-embedding-004");
        let url = provider.endpoint("embedContent").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn task_type_follows_mode() {
        let provider = GeminiEmbeddingProvider::new("key").unwrap();
        let json = serde_json::to_value(provider.request("q", EmbedMode::Query)).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["content"]["parts"][0]["text"], "q");
        let json = serde_json::to_value(provider.request("d", EmbedMode::Document)).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_DOCUMENT");
    }
}
