//! Response types for the HTTP boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A retrieved source fragment returned alongside an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnippet {
    /// Chunk that grounded the answer
    pub chunk_id: Uuid,
    /// Owning document
    pub document_id: Uuid,
    /// Chunk text
    pub content: String,
    /// Cosine similarity to the query (0.0-1.0, higher is closer)
    pub similarity: f32,
}

/// Chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated (or cached) answer
    pub answer: String,
    /// Session the exchange was recorded under
    pub session_id: String,
    /// Whether the answer was served from the response cache
    pub cached: bool,
    /// Source fragments used to ground the answer (empty on cache hits)
    #[serde(default)]
    pub sources: Vec<SourceSnippet>,
    /// When the response was produced
    pub timestamp: DateTime<Utc>,
}

/// Ingest response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// ID of the created document
    pub document_id: Uuid,
    /// Source title
    pub title: String,
    /// Total chunks persisted
    pub chunk_count: usize,
}
