//! Error types for the chat server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures of the hosted services the server talks to.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A hosted API call failed or returned something unusable.
    #[error("{service} error: {message}")]
    Remote { service: &'static str, message: String },

    /// The request needs a capability that is not configured.
    #[error("{0}")]
    Unsupported(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

pub(crate) fn remote(service: &'static str, message: impl Into<String>) -> ServerError {
    ServerError::Remote { service, message: message.into() }
}

/// An HTTP error answered as `{"detail": message}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
