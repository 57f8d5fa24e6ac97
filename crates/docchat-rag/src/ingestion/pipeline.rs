//! Ingestion flow: chunk, embed, persist
//!
//! Chunks are independent and order-insensitive for storage, so embedding
//! and insertion run concurrently up to a bounded parallelism. Chunk indices
//! are assigned before parallelization so ordering metadata stays
//! deterministic.

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::ingestion::{clean_text, TextChunker};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{Chunk, Document};

/// Ingestion pipeline
pub struct IngestPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    parallel_embeddings: usize,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        Ok(Self {
            chunker: TextChunker::from_config(&config.chunking)?,
            embedder,
            vector_store,
            parallel_embeddings: config.ingestion.parallel_embeddings.max(1),
        })
    }

    /// Ingest a document: chunk, embed and persist, returning the document
    /// record with its persisted chunk count.
    pub async fn ingest(&self, title: &str, raw_text: &str) -> Result<Document> {
        let cleaned = clean_text(raw_text);
        if cleaned.trim().is_empty() {
            return Err(Error::ingestion(format!(
                "no extractable text in '{}'",
                title
            )));
        }

        let fragments = self.chunker.chunk(raw_text);
        if fragments.is_empty() {
            return Err(Error::ingestion(format!(
                "'{}' produced no chunks above the minimum length",
                title
            )));
        }

        let mut document = Document::new(title, cleaned.chars().count());

        // Indices are fixed here, before any concurrency.
        let parsed_at = Utc::now().to_rfc3339();
        let chunks: Vec<Chunk> = fragments
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                Chunk::new(document.id, content, index as u32)
                    .with_metadata("source", serde_json::json!(title))
                    .with_metadata("parsed_at", serde_json::json!(parsed_at))
            })
            .collect();

        let total = chunks.len();
        tracing::info!("Ingesting '{}': {} chunks", title, total);

        let semaphore = Arc::new(Semaphore::new(self.parallel_embeddings));

        let futures: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let embedder = Arc::clone(&self.embedder);
                let vector_store = Arc::clone(&self.vector_store);
                let sem = Arc::clone(&semaphore);

                async move {
                    let _permit = sem
                        .acquire()
                        .await
                        .map_err(|_| Error::internal("ingest semaphore closed"))?;

                    let embedding = embedder.embed(&chunk.content).await?;
                    let chunk = chunk.with_embedding(embedding);
                    vector_store.insert_chunk(&chunk).await?;
                    Ok::<u32, Error>(chunk.chunk_index)
                }
            })
            .collect();

        let mut persisted = 0usize;
        let mut first_error = None;

        for result in join_all(futures).await {
            match result {
                Ok(_) => persisted += 1,
                Err(e) => {
                    // A failed chunk aborts only that chunk.
                    tracing::warn!("Chunk failed during ingest of '{}': {}", title, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if persisted == 0 {
            return Err(first_error
                .unwrap_or_else(|| Error::ingestion(format!("no chunks persisted for '{}'", title))));
        }

        if persisted < total {
            tracing::warn!(
                "Ingested '{}' partially: {}/{} chunks persisted",
                title,
                persisted,
                total
            );
        }

        document.chunk_count = persisted;
        Ok(document)
    }
}
