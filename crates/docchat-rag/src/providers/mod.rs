//! Provider abstractions for the external collaborators
//!
//! The orchestrator only sees these narrow capability traits, so alternate
//! backends (a remote vector database, Redis for the cache store, a cloud
//! model API) can be substituted without touching the pipeline.

pub mod cache;
pub mod local;
pub mod ollama;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Chunk;

/// A chunk matched by nearest-neighbor search
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (0.0-1.0, higher is closer)
    pub similarity: f32,
}

/// Trait for generating text embeddings
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    ///
    /// Stateless per call; concurrent calls are independent. Empty or
    /// whitespace-only input yields the zero vector without a model call.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimensionality (e.g. 768 for nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Trait for completion-based answer generation
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion from a system instruction and a user message.
    ///
    /// Implementations must not retry on failure; generation calls are
    /// cost-bearing.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// The model being used
    fn model(&self) -> &str;
}

/// Trait for vector storage and similarity search
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert a chunk with its embedding. No ordering guarantee across
    /// concurrent inserts.
    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Search for the `k` chunks nearest to the query vector, ordered by
    /// descending similarity with ties broken by insertion order. Returning
    /// fewer than `k` results (including zero) is valid.
    async fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Trait for a TTL-bounded key-value store.
///
/// Backs both session memory and the response cache; an external store (e.g.
/// Redis) keeps conversations alive across process restarts.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value; expired or missing keys yield `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value with a per-key TTL. Writing an existing key resets its
    /// expiry clock.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
