//! Chat request shapes and input normalization.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Message returned when an image arrives without a caption.
pub const IMAGE_WITHOUT_TEXT: &str = "Please provide text with the image";

/// Message returned when no usable input is present.
pub const NO_VALID_INPUT: &str =
    "No valid input provided. Please send text, audio, or image with text.";

fn default_city() -> String {
    "Bangalore".to_string()
}

/// Body of `POST /api/chat_endpoint`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub text: String,
    /// Base64-encoded LINEAR16 audio.
    #[serde(default)]
    pub audio_file: Option<String>,
    /// Base64-encoded JPEG.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub preferred_language: String,
}

/// Body of a successful chat reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text_response: String,
    pub audio_response_base64: String,
}

/// Who is asking, passed to the orchestrator as session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub preferred_language: String,
}

impl FarmerProfile {
    /// One-line description for prompts, or `None` when nothing is known.
    pub fn describe(&self) -> Option<String> {
        let location: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        let mut facts = Vec::new();
        if !self.name.trim().is_empty() {
            facts.push(format!("name: {}", self.name.trim()));
        }
        if !location.is_empty() {
            facts.push(format!("location: {}", location.join(", ")));
        }
        if !self.preferred_language.trim().is_empty() {
            facts.push(format!("preferred language: {}", self.preferred_language.trim()));
        }

        if facts.is_empty() { None } else { Some(format!("Farmer profile ({})", facts.join("; "))) }
    }
}

impl From<&ChatRequest> for FarmerProfile {
    fn from(request: &ChatRequest) -> Self {
        Self {
            name: request.name.clone(),
            city: request.city.clone(),
            state: request.state.clone(),
            country: request.country.clone(),
            preferred_language: request.preferred_language.clone(),
        }
    }
}

/// What the user said, after speech recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMessage {
    Text(String),
    /// A caption with a base64 JPEG.
    Multimodal { text: String, image_base64: String },
}

impl UserMessage {
    /// The textual part of the message.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Multimodal { text, .. } => text,
        }
    }
}

/// A normalized request for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInput {
    pub message: UserMessage,
    pub profile: FarmerProfile,
}

/// The input kind a chat request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Decoded audio still to be transcribed.
    Audio(Vec<u8>),
    Message(UserMessage),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve a request to audio, multimodal, or text input.
///
/// Audio takes precedence, then an image with a caption, then plain text.
pub fn classify(request: &ChatRequest) -> Result<ChatInput, ApiError> {
    if let Some(audio) = present(&request.audio_file) {
        let bytes = STANDARD
            .decode(audio)
            .map_err(|e| ApiError::BadRequest(format!("Invalid base64 audio: {e}")))?;
        return Ok(ChatInput::Audio(bytes));
    }

    let text = request.text.trim();
    if let Some(image) = present(&request.image) {
        if text.is_empty() {
            return Err(ApiError::Unprocessable(IMAGE_WITHOUT_TEXT.to_string()));
        }
        return Ok(ChatInput::Message(UserMessage::Multimodal {
            text: text.to_string(),
            image_base64: image.to_string(),
        }));
    }

    if text.is_empty() {
        return Err(ApiError::BadRequest(NO_VALID_INPUT.to_string()));
    }
    Ok(ChatInput::Message(UserMessage::Text(text.to_string())))
}
