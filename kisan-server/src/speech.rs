//! Speech recognition and synthesis over the Google Cloud REST APIs.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Result, remote};

pub const SPEECH_BASE_URL: &str = "https://speech.googleapis.com/v1/";
pub const TTS_BASE_URL: &str = "https://texttospeech.googleapis.com/v1/";

const STT: &str = "speech-to-text";
const TTS: &str = "text-to-speech";

/// Turns recorded audio into text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe 16 kHz LINEAR16 audio. An empty string means nothing was recognized.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Turns text into playable audio.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text` as MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Client for `speech:recognize` and `text:synthesize`.
#[derive(Clone)]
pub struct GoogleSpeechClient {
    client: Client,
    api_key: String,
    speech_url: Url,
    tts_url: Url,
    language_code: String,
}

fn parse_base(service: &'static str, base: &str) -> Result<Url> {
    let normalized = if base.ends_with('/') { base.to_string() } else { format!("{base}/") };
    Url::parse(&normalized).map_err(|e| remote(service, format!("invalid base URL: {e}")))
}

impl GoogleSpeechClient {
    pub fn new(api_key: impl Into<String>, language_code: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_key: api_key.into(),
            speech_url: parse_base(STT, SPEECH_BASE_URL)?,
            tts_url: parse_base(TTS, TTS_BASE_URL)?,
            language_code: language_code.into(),
        })
    }

    /// Point both APIs at other roots.
    pub fn with_base_urls(mut self, speech: &str, tts: &str) -> Result<Self> {
        self.speech_url = parse_base(STT, speech)?;
        self.tts_url = parse_base(TTS, tts)?;
        Ok(self)
    }

    /// `method` is joined onto `base`; a leading `./` keeps a colon in it
    /// from being read as a URL scheme.
    async fn post<Req: Serialize, Res: serde::de::DeserializeOwned>(
        &self,
        service: &'static str,
        base: &Url,
        method: &str,
        body: &Req,
    ) -> Result<Res> {
        let url = base.join(method).map_err(|e| remote(service, format!("invalid endpoint: {e}")))?;
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| remote(service, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(service, %status, "API error");
            return Err(remote(service, format!("API returned {status}: {body}")));
        }

        response.json().await.map_err(|e| remote(service, format!("failed to parse response: {e}")))
    }
}

impl std::fmt::Debug for GoogleSpeechClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechClient")
            .field("language_code", &self.language_code)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    ssml_gender: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

#[async_trait]
impl SpeechToText for GoogleSpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        debug!(bytes = audio.len(), "recognizing speech");
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 16_000,
                language_code: &self.language_code,
            },
            audio: RecognitionAudio { content: STANDARD.encode(audio) },
        };
        let response: RecognizeResponse =
            self.post(STT, &self.speech_url, "./speech:recognize", &body).await?;

        Ok(response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default())
    }
}

#[async_trait]
impl TextToSpeech for GoogleSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        debug!(chars = text.chars().count(), "synthesizing speech");
        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection { language_code: &self.language_code, ssml_gender: "NEUTRAL" },
            audio_config: AudioConfig { audio_encoding: "MP3" },
        };
        let response: SynthesizeResponse =
            self.post(TTS, &self.tts_url, "./text:synthesize", &body).await?;

        STANDARD
            .decode(response.audio_content)
            .map_err(|e| remote(TTS, format!("invalid audio content: {e}")))
    }
}
