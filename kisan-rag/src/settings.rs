//! Environment-driven store settings and startup wiring.
//!
//! [`StoreSettings::from_env`] reads the recognized variables once;
//! [`connect`] turns them into a [`StoreAvailability`] that the retrieval
//! tool holds for the life of the process.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{DEFAULT_DIMENSIONS, RagConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorStore;
use crate::service::RagService;
use crate::tool::StoreAvailability;
use crate::vectorstore::VectorStore;

/// Default collection holding the government scheme corpus.
pub const DEFAULT_COLLECTION: &str = "government_schemes";

/// Default embedding model identifier.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Default Qdrant gRPC port.
pub const DEFAULT_QDRANT_PORT: u16 = 6334;

/// Which vector store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Qdrant if reachable, otherwise the in-memory store.
    #[default]
    Auto,
    /// Always the in-memory store.
    Memory,
    /// Qdrant only; an unreachable server leaves the store unavailable.
    Qdrant,
}

impl std::str::FromStr for StoreMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "memory" | "in-memory" | ":memory:" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(RagError::ConfigError(format!("unknown vector store mode '{other}'"))),
        }
    }
}

/// Connection and naming settings for the vector store and embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Backend selection.
    pub mode: StoreMode,
    /// Hosted Qdrant URL; used together with `qdrant_api_key`.
    pub qdrant_url: Option<String>,
    /// Hosted Qdrant API key.
    #[serde(skip_serializing)]
    pub qdrant_api_key: Option<String>,
    /// Local Qdrant host.
    pub qdrant_host: String,
    /// Local Qdrant gRPC port.
    pub qdrant_port: u16,
    /// Collection name.
    pub collection: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Embedding dimensionality.
    pub dimensions: usize,
    /// Key for the hosted embedding API.
    #[serde(skip_serializing)]
    pub google_api_key: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            mode: StoreMode::Auto,
            qdrant_url: None,
            qdrant_api_key: None,
            qdrant_host: "localhost".to_string(),
            qdrant_port: DEFAULT_QDRANT_PORT,
            collection: DEFAULT_COLLECTION.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            google_api_key: None,
        }
    }
}

impl StoreSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset
    /// or empty variables.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for unparsable port, dimension, or
    /// mode values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mode = match get("KISAN_VECTOR_STORE") {
            Some(v) => v.parse()?,
            None => defaults.mode,
        };
        let qdrant_port = match get("QDRANT_PORT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| RagError::ConfigError(format!("invalid QDRANT_PORT '{v}'")))?,
            None => defaults.qdrant_port,
        };
        let dimensions = match get("EMBEDDING_DIMENSIONS") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| RagError::ConfigError(format!("invalid EMBEDDING_DIMENSIONS '{v}'")))?,
            None => defaults.dimensions,
        };

        Ok(Self {
            mode,
            qdrant_url: get("QDRANT_URL"),
            qdrant_api_key: get("QDRANT_API_KEY"),
            qdrant_host: get("QDRANT_HOST").unwrap_or(defaults.qdrant_host),
            qdrant_port,
            collection: get("QDRANT_COLLECTION_NAME").unwrap_or(defaults.collection),
            embedding_model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            dimensions,
            google_api_key: get("GOOGLE_API_KEY"),
        })
    }

    /// A [`RagConfig`] whose dimensionality matches the configured
    /// embedding model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimensions` is zero.
    pub fn rag_config(&self) -> Result<RagConfig> {
        RagConfig::builder().dimensions(self.dimensions).build()
    }

    /// The hosted URL and key, when both are set.
    pub fn cloud_credentials(&self) -> Option<(&str, &str)> {
        match (&self.qdrant_url, &self.qdrant_api_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

/// Build the configured embedding provider.
#[cfg(feature = "gemini")]
pub fn embedding_provider(settings: &StoreSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let key = settings
        .google_api_key
        .as_deref()
        .ok_or_else(|| RagError::ConfigError("GOOGLE_API_KEY is not set".to_string()))?;
    let provider = crate::gemini::GeminiEmbeddingProvider::new(key)?
        .with_model(settings.embedding_model.clone())
        .with_dimensions(settings.dimensions);
    Ok(Arc::new(provider))
}

/// Build the configured embedding provider.
#[cfg(not(feature = "gemini"))]
pub fn embedding_provider(_settings: &StoreSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(RagError::ConfigError("built without the `gemini` embedding provider".to_string()))
}

#[cfg(feature = "qdrant")]
async fn qdrant_store(settings: &StoreSettings) -> Result<Arc<dyn VectorStore>> {
    use crate::qdrant::QdrantVectorStore;

    let store = match settings.cloud_credentials() {
        Some((url, key)) => QdrantVectorStore::new(url, Some(key))?,
        None => QdrantVectorStore::local(&settings.qdrant_host, settings.qdrant_port)?,
    };
    store.health_check().await?;
    info!(
        host = %settings.qdrant_host,
        port = settings.qdrant_port,
        cloud = settings.cloud_credentials().is_some(),
        "connected to qdrant"
    );
    Ok(Arc::new(store))
}

#[cfg(not(feature = "qdrant"))]
async fn qdrant_store(_settings: &StoreSettings) -> Result<Arc<dyn VectorStore>> {
    Err(RagError::ConfigError("built without the `qdrant` backend".to_string()))
}

/// Select the vector store backend for `settings`.
///
/// In [`StoreMode::Auto`] an unreachable Qdrant server falls back to an
/// in-memory store whose contents do not persist.
pub async fn vector_store(settings: &StoreSettings) -> Result<Arc<dyn VectorStore>> {
    match settings.mode {
        StoreMode::Memory => {
            info!("using in-memory vector store (data will not persist)");
            Ok(Arc::new(InMemoryVectorStore::new()))
        }
        StoreMode::Qdrant => qdrant_store(settings).await,
        StoreMode::Auto => match qdrant_store(settings).await {
            Ok(store) => Ok(store),
            Err(e) => {
                warn!(error = %e, "could not connect to qdrant, falling back to in-memory store");
                Ok(Arc::new(InMemoryVectorStore::new()))
            }
        },
    }
}

/// Wire the service from `settings` using the given embedding provider.
pub async fn connect_with(
    settings: &StoreSettings,
    config: RagConfig,
    provider: Arc<dyn EmbeddingProvider>,
) -> StoreAvailability {
    let built = async {
        let store = vector_store(settings).await?;
        RagService::builder().config(config).embedding_provider(provider).vector_store(store).build()
    }
    .await;

    match built {
        Ok(service) => StoreAvailability::Available(Arc::new(service)),
        Err(e) => {
            warn!(error = %e, "vector store unavailable");
            StoreAvailability::Unavailable { reason: e.to_string() }
        }
    }
}

/// Wire the service from `settings`, building the embedding provider too.
///
/// Called once at startup; the result never changes afterwards.
pub async fn connect(settings: &StoreSettings, config: RagConfig) -> StoreAvailability {
    match embedding_provider(settings) {
        Ok(provider) => connect_with(settings, config, provider).await,
        Err(e) => {
            warn!(error = %e, "embedding provider unavailable");
            StoreAvailability::Unavailable { reason: e.to_string() }
        }
    }
}
