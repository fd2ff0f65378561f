//! Server settings read from the environment.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// Default orchestrator model.
pub const DEFAULT_AGENT_MODEL: &str = "models/gemini-2.5-flash";

/// Listen address and hosted-service settings for the chat server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// BCP-47 code used for speech recognition and synthesis.
    pub language_code: String,
    pub agent_model: String,
    /// Key for the generation and speech APIs; without it those capabilities are disabled.
    #[serde(skip_serializing)]
    pub google_api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8084,
            language_code: "en-US".to_string(),
            agent_model: DEFAULT_AGENT_MODEL.to_string(),
            google_api_key: None,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or empty variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("KISAN_PORT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ServerError::Config(format!("invalid KISAN_PORT '{v}'")))?,
            None => defaults.port,
        };

        Ok(Self {
            host: get("KISAN_HOST").unwrap_or(defaults.host),
            port,
            language_code: get("KISAN_LANGUAGE_CODE").unwrap_or(defaults.language_code),
            agent_model: get("KISAN_AGENT_MODEL").unwrap_or(defaults.agent_model),
            google_api_key: get("GOOGLE_API_KEY"),
        })
    }
}
