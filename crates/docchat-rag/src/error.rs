//! Error types for the RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request rejected before any external call (empty question,
    /// mismatched vector dimensionality)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Ingestion produced no usable text
    #[error("Ingestion failed: {0}")]
    IngestionFailed(String),

    /// Embedding backend unreachable or returned malformed output
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Generation model returned no usable text
    #[error("Generation model returned an empty completion")]
    GenerationEmpty,

    /// Generation backend failure
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    VectorDb(String),

    /// Cache/session store error
    #[error("Cache store error: {0}")]
    CacheStore(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an ingestion error
    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::IngestionFailed(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a vector store error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create a cache store error
    pub fn cache_store(message: impl Into<String>) -> Self {
        Self::CacheStore(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            Error::IngestionFailed(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ingestion_failed", msg.clone())
            }
            Error::EmbeddingUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "embedding_unavailable", msg.clone())
            }
            Error::GenerationEmpty => (
                StatusCode::BAD_GATEWAY,
                "generation_empty",
                self.to_string(),
            ),
            Error::Generation(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_error", msg.clone())
            }
            Error::VectorDb(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error", msg.clone())
            }
            Error::CacheStore(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "cache_store_error", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
