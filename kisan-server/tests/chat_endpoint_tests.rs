//! Contract tests for the chat endpoint, served in-process.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kisan_server::input::{AgentInput, UserMessage};
use kisan_server::orchestrator::Orchestrator;
use kisan_server::speech::{SpeechToText, TextToSpeech};
use kisan_server::{AppState, ServerError, app_router};
use serde_json::{Value, json};

/// Replies with the text it was given and records each input.
#[derive(Default)]
struct Echo {
    seen: Mutex<Vec<AgentInput>>,
}

#[async_trait]
impl Orchestrator for Echo {
    async fn answer(&self, input: &AgentInput) -> kisan_server::Result<String> {
        self.seen.lock().unwrap().push(input.clone());
        Ok(format!("answer to: {}", input.message.text()))
    }
}

struct Silent;

#[async_trait]
impl Orchestrator for Silent {
    async fn answer(&self, _input: &AgentInput) -> kisan_server::Result<String> {
        Ok("   ".to_string())
    }
}

struct Broken;

#[async_trait]
impl Orchestrator for Broken {
    async fn answer(&self, _input: &AgentInput) -> kisan_server::Result<String> {
        Err(ServerError::Unsupported("agent offline".to_string()))
    }
}

struct Transcript(&'static str);

#[async_trait]
impl SpeechToText for Transcript {
    async fn transcribe(&self, _audio: &[u8]) -> kisan_server::Result<String> {
        Ok(self.0.to_string())
    }
}

struct Voice;

#[async_trait]
impl TextToSpeech for Voice {
    async fn synthesize(&self, text: &str) -> kisan_server::Result<Vec<u8>> {
        Ok(text.len().to_le_bytes().to_vec())
    }
}

struct Mute;

#[async_trait]
impl TextToSpeech for Mute {
    async fn synthesize(&self, _text: &str) -> kisan_server::Result<Vec<u8>> {
        Err(ServerError::Config("no voice".to_string()))
    }
}

async fn spawn_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn post_chat(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/api/chat_endpoint", base))
        .json(&body)
        .send()
        .await
        .expect("chat response");
    let status = response.status().as_u16();
    let json = response.json().await.expect("chat json");
    (status, json)
}

#[tokio::test]
async fn root_reports_running() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let body: Value = reqwest::get(format!("{}/", base)).await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({"message": "Chat API is running."}));
    handle.abort();
}

#[tokio::test]
async fn text_is_answered_and_spoken() {
    let echo = Arc::new(Echo::default());
    let state = AppState {
        orchestrator: Some(echo.clone()),
        speech_to_text: None,
        text_to_speech: Some(Arc::new(Voice)),
    };
    let (base, handle) = spawn_server(state).await;

    let (status, body) = post_chat(
        &base,
        json!({"text": "  PM Kisan eligibility ", "name": "Ravi", "state": "Karnataka"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["text_response"], "answer to: PM Kisan eligibility");
    let audio = STANDARD.decode(body["audio_response_base64"].as_str().unwrap()).unwrap();
    assert_eq!(audio, "answer to: PM Kisan eligibility".len().to_le_bytes().to_vec());

    let seen = echo.seen.lock().unwrap();
    assert_eq!(seen[0].profile.name, "Ravi");
    assert_eq!(seen[0].profile.city, "Bangalore");
    assert_eq!(seen[0].profile.state, "Karnataka");
    handle.abort();
}

#[tokio::test]
async fn image_with_caption_is_multimodal() {
    let echo = Arc::new(Echo::default());
    let state = AppState { orchestrator: Some(echo.clone()), ..AppState::default() };
    let (base, handle) = spawn_server(state).await;

    let (status, body) =
        post_chat(&base, json!({"text": "What pest is this?", "image": "/9j/4AAQ"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["text_response"], "answer to: What pest is this?");
    assert_eq!(body["audio_response_base64"], "");
    assert_eq!(
        echo.seen.lock().unwrap()[0].message,
        UserMessage::Multimodal {
            text: "What pest is this?".to_string(),
            image_base64: "/9j/4AAQ".to_string()
        }
    );
    handle.abort();
}

#[tokio::test]
async fn image_without_text_is_unprocessable() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let (status, body) = post_chat(&base, json!({"text": "", "image": "/9j/4AAQ"})).await;
    assert_eq!(status, 422);
    assert_eq!(body, json!({"detail": "Please provide text with the image"}));
    handle.abort();
}

#[tokio::test]
async fn empty_input_is_bad_request() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let (status, body) = post_chat(&base, json!({"text": "   "})).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["detail"],
        "No valid input provided. Please send text, audio, or image with text."
    );
    handle.abort();
}

#[tokio::test]
async fn audio_is_transcribed_first() {
    let echo = Arc::new(Echo::default());
    let state = AppState {
        orchestrator: Some(echo.clone()),
        speech_to_text: Some(Arc::new(Transcript("mandi rate for ragi"))),
        text_to_speech: None,
    };
    let (base, handle) = spawn_server(state).await;

    let audio = STANDARD.encode([0u8; 32]);
    let (status, body) = post_chat(&base, json!({"text": "typed", "audio_file": audio})).await;
    assert_eq!(status, 200);
    assert_eq!(body["text_response"], "answer to: mandi rate for ragi");
    handle.abort();
}

#[tokio::test]
async fn audio_errors_map_to_status_codes() {
    let state = AppState {
        speech_to_text: Some(Arc::new(Transcript("  "))),
        ..AppState::default()
    };
    let (base, handle) = spawn_server(state).await;

    let (status, _) = post_chat(&base, json!({"audio_file": "not base64!"})).await;
    assert_eq!(status, 400);

    let (status, body) = post_chat(&base, json!({"audio_file": STANDARD.encode([1u8, 2])})).await;
    assert_eq!(status, 400);
    assert_eq!(body["detail"], "Could not transcribe audio.");
    handle.abort();

    let (base, handle) = spawn_server(AppState::default()).await;
    let (status, body) = post_chat(&base, json!({"audio_file": STANDARD.encode([1u8, 2])})).await;
    assert_eq!(status, 500);
    assert!(body["detail"].as_str().unwrap().starts_with("Speech-to-Text processing failed"));
    handle.abort();
}

#[tokio::test]
async fn missing_orchestrator_gives_demo_response() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let (status, body) = post_chat(&base, json!({"text": "Which subsidy can I get?"})).await;
    assert_eq!(status, 200);
    let text = body["text_response"].as_str().unwrap();
    assert!(text.contains("PM-KISAN"));
    assert!(text.contains("This is a demo response"));
    handle.abort();
}

#[tokio::test]
async fn failed_or_empty_answers_fall_back_to_demo() {
    for orchestrator in [Arc::new(Silent) as Arc<dyn Orchestrator>, Arc::new(Broken)] {
        let state = AppState { orchestrator: Some(orchestrator), ..AppState::default() };
        let (base, handle) = spawn_server(state).await;
        let (status, body) = post_chat(&base, json!({"text": "namaskara"})).await;
        assert_eq!(status, 200);
        assert!(body["text_response"].as_str().unwrap().contains("Your query: \"namaskara\""));
        handle.abort();
    }
}

#[tokio::test]
async fn speech_failure_still_answers() {
    let state = AppState {
        orchestrator: Some(Arc::new(Echo::default())),
        speech_to_text: None,
        text_to_speech: Some(Arc::new(Mute)),
    };
    let (base, handle) = spawn_server(state).await;
    let (status, body) = post_chat(&base, json!({"text": "weather"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["text_response"], "answer to: weather");
    assert_eq!(body["audio_response_base64"], "");
    handle.abort();
}
