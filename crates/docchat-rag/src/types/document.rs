//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An ingested source document. Created once per ingestion, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Caller-supplied title (filename or source name)
    pub title: String,
    /// Length of the cleaned source text in characters
    pub char_count: usize,
    /// Number of chunks produced from this document
    pub chunk_count: usize,
    /// When the document was ingested
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(title: impl Into<String>, char_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            char_count,
            chunk_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// A bounded fragment of a document together with its embedding vector.
///
/// Chunks are created in bulk during ingestion and never mutated. The
/// embedding dimensionality must match the vector store it is inserted into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Owning document
    pub document_id: Uuid,
    /// Chunk text
    pub content: String,
    /// Embedding vector (dimension fixed by the embedding model)
    pub embedding: Vec<f32>,
    /// Position of this chunk within the document, assigned before any
    /// parallel embedding so ordering metadata stays deterministic
    pub chunk_index: u32,
    /// Free-form metadata (source title, parse timestamp)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chunk {
    /// Create a new chunk without an embedding yet
    pub fn new(document_id: Uuid, content: String, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            embedding: Vec::new(),
            chunk_index,
            metadata: HashMap::new(),
        }
    }

    /// Attach an embedding vector
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
