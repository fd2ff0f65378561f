//! # kisan-server
//!
//! HTTP chat endpoint for the KisanVaani farming assistant.
//!
//! A request carries text, base64 audio, or a base64 image with a caption.
//! Audio is transcribed, the question is answered by the
//! [`SchemeOrchestrator`](orchestrator::SchemeOrchestrator) from the scheme
//! corpus and a web search, and the answer is returned as text and MP3.
//!
//! ```text
//! POST /api/chat_endpoint
//! {"text": "PM Kisan eligibility", "city": "Mysuru", "state": "Karnataka"}
//! → {"text_response": "...", "audio_response_base64": "..."}
//! ```

pub mod config;
pub mod demo;
pub mod error;
pub mod gemini;
pub mod input;
pub mod orchestrator;
pub mod server;
pub mod speech;

pub use config::ServerConfig;
pub use error::{ApiError, Result, ServerError};
pub use server::{AppState, app_router, build_state, run_server};
