//! Application state for the RAG server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::engine::RagEngine;
use crate::error::Result;
use crate::providers::cache::InMemoryCacheStore;
use crate::providers::local::InMemoryVectorStore;
use crate::providers::ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    engine: RagEngine,
    ready: RwLock<bool>,
}

impl AppState {
    /// Wire up the default provider set: Ollama for embeddings and
    /// generation, in-process stores for vectors and the TTL cache.
    pub fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!("Initializing RAG application state...");

        let ollama = Arc::new(OllamaClient::new(&config.llm)?);
        let embedder = Arc::new(OllamaEmbedder::new(Arc::clone(&ollama), &config.embeddings));
        let generator = Arc::new(OllamaGenerator::new(ollama, &config.llm));
        tracing::info!(
            "Ollama providers initialized (embed: {}, generate: {})",
            config.llm.embed_model,
            config.llm.generate_model
        );

        let vector_store = Arc::new(InMemoryVectorStore::new(config.embeddings.dimensions));
        let cache_store = Arc::new(InMemoryCacheStore::new());
        tracing::info!(
            "Stores initialized (vector dims: {})",
            config.embeddings.dimensions
        );

        let engine = RagEngine::new(
            config.clone(),
            embedder,
            generator,
            vector_store,
            cache_store,
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                ready: RwLock::new(true),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the RAG engine
    pub fn engine(&self) -> &RagEngine {
        &self.inner.engine
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }
}
