use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kisan_rag::{RetrievalTool, StoreSettings, connect};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    config::ServerConfig,
    demo::demo_response,
    error::ApiError,
    gemini::GeminiClient,
    input::{AgentInput, ChatInput, ChatRequest, ChatResponse, FarmerProfile, UserMessage, classify},
    orchestrator::{Orchestrator, SchemeOrchestrator},
    speech::{GoogleSpeechClient, SpeechToText, TextToSpeech},
};

/// Services shared by every request. Absent services are treated as disabled.
#[derive(Clone, Default)]
pub struct AppState {
    pub orchestrator: Option<Arc<dyn Orchestrator>>,
    pub speech_to_text: Option<Arc<dyn SpeechToText>>,
    pub text_to_speech: Option<Arc<dyn TextToSpeech>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.orchestrator.is_some())
            .field("speech_to_text", &self.speech_to_text.is_some())
            .field("text_to_speech", &self.text_to_speech.is_some())
            .finish()
    }
}

/// Wire the hosted services described by `config` and `store`.
///
/// Without a Google API key only the demo replies remain.
pub async fn build_state(config: &ServerConfig, store: &StoreSettings) -> anyhow::Result<AppState> {
    let Some(api_key) = config.google_api_key.as_deref() else {
        warn!("GOOGLE_API_KEY is not set; answering with demo responses and no speech");
        return Ok(AppState::default());
    };

    let availability = connect(store, store.rag_config()?).await;
    let retrieval = RetrievalTool::new(availability, store.collection.clone());
    info!(corpus_available = retrieval.is_available(), collection = %store.collection, "retrieval tool ready");

    let gemini = Arc::new(GeminiClient::new(api_key)?.with_model(config.agent_model.clone()));
    let orchestrator =
        SchemeOrchestrator::new(retrieval).with_web_search(gemini.clone()).with_model(gemini);

    let speech = Arc::new(GoogleSpeechClient::new(api_key, config.language_code.clone())?);

    Ok(AppState {
        orchestrator: Some(Arc::new(orchestrator)),
        speech_to_text: Some(speech.clone()),
        text_to_speech: Some(speech),
    })
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/chat_endpoint", post(chat_endpoint))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let store = StoreSettings::from_env()?;
    let state = build_state(&config, &store).await?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for kisan-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("kisan-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> impl IntoResponse {
    Json(json!({"message": "Chat API is running."}))
}

async fn chat_endpoint(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = match classify(&request)? {
        ChatInput::Audio(audio) => UserMessage::Text(transcribe(&state, &audio).await?),
        ChatInput::Message(message) => message,
    };

    let input = AgentInput { message, profile: FarmerProfile::from(&request) };
    let text_response = answer(&state, &input).await;
    let audio = synthesize(&state, &text_response).await;

    Ok(Json(ChatResponse { text_response, audio_response_base64: STANDARD.encode(audio) }))
}

async fn transcribe(state: &AppState, audio: &[u8]) -> Result<String, ApiError> {
    let Some(stt) = &state.speech_to_text else {
        return Err(ApiError::Internal(
            "Speech-to-Text processing failed: speech recognition is not configured".to_string(),
        ));
    };

    let transcript = stt.transcribe(audio).await.map_err(|e| {
        error!(error = %e, "speech recognition failed");
        ApiError::Internal(format!("Speech-to-Text processing failed: {e}"))
    })?;

    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(ApiError::BadRequest("Could not transcribe audio.".to_string()));
    }
    info!(chars = transcript.chars().count(), "transcribed audio");
    Ok(transcript.to_string())
}

async fn answer(state: &AppState, input: &AgentInput) -> String {
    let query = input.message.text();
    let Some(orchestrator) = &state.orchestrator else {
        warn!("no orchestrator configured, using demo response");
        return demo_response(query);
    };

    match orchestrator.answer(input).await {
        Ok(answer) if !answer.trim().is_empty() => answer,
        Ok(_) => {
            warn!("orchestrator returned an empty answer, using demo response");
            demo_response(query)
        }
        Err(e) => {
            warn!(error = %e, "orchestrator failed, using demo response");
            demo_response(query)
        }
    }
}

async fn synthesize(state: &AppState, text: &str) -> Vec<u8> {
    let Some(tts) = &state.text_to_speech else {
        return Vec::new();
    };
    match tts.synthesize(text).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(error = %e, "text-to-speech failed, continuing without audio");
            Vec::new()
        }
    }
}
