//! Gemini `generateContent` client backing web search and answer synthesis.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::DEFAULT_AGENT_MODEL;
use crate::error::{Result, remote};
use crate::orchestrator::{AnswerModel, Prompt, WebSearch};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

const PROVIDER: &str = "gemini";

const SEARCH_INSTRUCTION: &str = "You research government agricultural schemes for Indian farmers. \
Use Google Search to find current, official information relevant to the query: eligibility, \
benefits, how to apply, and deadlines. Include the official portal link for every scheme you mention.";

/// Minimal Gemini client for text and image prompts.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(remote(PROVIDER, "API key must not be empty"));
        }
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| remote(PROVIDER, format!("invalid base URL: {e}")))?;
        Ok(Self { client: Client::new(), api_key, base_url, model: DEFAULT_AGENT_MODEL.to_string() })
    }

    /// Use `model`, adding the `models/` prefix if missing.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = if model.starts_with("models/") { model } else { format!("models/{model}") };
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let normalized =
            if base_url.ends_with('/') { base_url.to_string() } else { format!("{base_url}/") };
        self.base_url = Url::parse(&normalized)
            .map_err(|e| remote(PROVIDER, format!("invalid base URL: {e}")))?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one `generateContent` call and return the first candidate's text.
    async fn generate(&self, request: &GenerateContentRequest<'_>) -> Result<String> {
        let url = self
            .base_url
            .join(&format!("{}:generateContent", self.model))
            .map_err(|e| remote(PROVIDER, format!("invalid endpoint: {e}")))?;

        debug!(model = %self.model, tools = request.tools.len(), "generating content");
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| remote(PROVIDER, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = PROVIDER, %status, "API error");
            return Err(remote(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| remote(PROVIDER, format!("failed to parse response: {e}")))?;
        Ok(parsed.text())
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient").field("model", &self.model).finish_non_exhaustive()
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Default)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: ResponseContent,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn instruction(text: &str) -> Content<'_> {
    Content { role: None, parts: vec![Part::Text { text }] }
}

// ── Orchestrator seams ───────────────────────────────────────────────

#[async_trait]
impl WebSearch for GeminiClient {
    async fn search(&self, query: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part::Text { text: query }] }],
            system_instruction: Some(instruction(SEARCH_INSTRUCTION)),
            tools: vec![Tool { google_search: GoogleSearch::default() }],
        };
        self.generate(&request).await
    }
}

#[async_trait]
impl AnswerModel for GeminiClient {
    async fn answer(&self, prompt: &Prompt) -> Result<String> {
        let mut parts = vec![Part::Text { text: &prompt.text }];
        if let Some(image) = &prompt.image_jpeg_base64 {
            parts.push(Part::InlineData { inline_data: Blob { mime_type: "image/jpeg", data: image } });
        }
        let request = GenerateContentRequest {
            contents: vec![Content { role: Some("user"), parts }],
            system_instruction: Some(instruction(&prompt.instruction)),
            tools: Vec::new(),
        };
        self.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_uses_gemini_field_names() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text { text: "what is this?" },
                    Part::InlineData { inline_data: Blob { mime_type: "image/jpeg", data: "AAAA" } },
                ],
            }],
            system_instruction: Some(instruction("be brief")),
            tools: vec![Tool { google_search: GoogleSearch::default() }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "what is this?" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AAAA" } }
                    ]
                }],
                "systemInstruction": { "parts": [{ "text": "be brief" }] },
                "tools": [{ "googleSearch": {} }]
            })
        );
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "PM-KISAN " }, { "text": "pays ₹6,000." }], "role": "model" } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.text(), "PM-KISAN pays ₹6,000.");

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
        assert_eq!(blocked.text(), "");
    }

    #[test]
    fn model_gets_prefix() {
        let client = GeminiClient::new("k").unwrap().with_model("gemini-2.0-flash");
        assert_eq!(client.model(), "models/gemini-2.0-flash");
        assert!(GeminiClient::new("").is_err());
    }
}
