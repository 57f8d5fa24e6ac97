//! Request types for the HTTP boundary

use serde::{Deserialize, Serialize};

/// Chat request: ask a question, optionally within a named session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Opaque caller-supplied session identifier. Absent means the shared
    /// anonymous session; callers needing isolation must always pass one.
    #[serde(default)]
    pub session_id: Option<String>,

    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (overrides config when set)
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Ingest request: raw plain text plus a source name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Source name used for chunk metadata
    pub title: String,
    /// Extracted plain text
    pub text: String,
}
