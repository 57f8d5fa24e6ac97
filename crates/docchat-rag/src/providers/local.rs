//! In-memory vector store with brute-force cosine search
//!
//! Reference implementation of `VectorStoreProvider`. Dimensionality is
//! fixed at creation; a mismatched vector fails the call rather than being
//! silently truncated.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::{ScoredChunk, VectorStoreProvider};

/// In-memory vector store
pub struct InMemoryVectorStore {
    /// Chunks in insertion order; search ties resolve to earlier entries
    chunks: RwLock<Vec<Chunk>>,
    /// Expected embedding dimensionality
    dimensions: usize,
}

impl InMemoryVectorStore {
    /// Create a store for vectors of the given dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
            dimensions,
        }
    }

    fn check_dimensions(&self, len: usize, what: &str) -> Result<()> {
        if len != self.dimensions {
            return Err(Error::invalid_request(format!(
                "{} has dimension {} but the store expects {}",
                what, len, self.dimensions
            )));
        }
        Ok(())
    }
}

/// Cosine similarity between two equal-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()> {
        if chunk.embedding.is_empty() {
            return Err(Error::vector_db("chunk has no embedding"));
        }
        self.check_dimensions(chunk.embedding.len(), "chunk embedding")?;

        self.chunks.write().push(chunk.clone());
        Ok(())
    }

    async fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        self.check_dimensions(query.len(), "query vector")?;

        let chunks = self.chunks.read();

        let mut results: Vec<ScoredChunk> = chunks
            .iter()
            .map(|chunk| ScoredChunk {
                similarity: cosine_similarity(query, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        // Stable sort keeps insertion order for equal similarities.
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.chunks.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chunk_with(embedding: Vec<f32>, content: &str) -> Chunk {
        Chunk::new(Uuid::new_v4(), content.to_string(), 0).with_embedding(embedding)
    }

    #[tokio::test]
    async fn search_orders_by_descending_similarity() {
        let store = InMemoryVectorStore::new(3);
        store
            .insert_chunk(&chunk_with(vec![0.0, 1.0, 0.0], "orthogonal"))
            .await
            .unwrap();
        store
            .insert_chunk(&chunk_with(vec![1.0, 0.0, 0.0], "aligned"))
            .await
            .unwrap();
        store
            .insert_chunk(&chunk_with(vec![1.0, 1.0, 0.0], "diagonal"))
            .await
            .unwrap();

        let results = store.nearest_neighbors(&[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.content, "aligned");
        assert_eq!(results[1].chunk.content, "diagonal");
        assert_eq!(results[2].chunk.content, "orthogonal");

        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn ties_break_by_insertion_order() {
        let store = InMemoryVectorStore::new(2);
        store
            .insert_chunk(&chunk_with(vec![1.0, 0.0], "first"))
            .await
            .unwrap();
        store
            .insert_chunk(&chunk_with(vec![2.0, 0.0], "second"))
            .await
            .unwrap();

        // Cosine similarity is scale-invariant, so both score 1.0.
        let results = store.nearest_neighbors(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].chunk.content, "first");
        assert_eq!(results[1].chunk.content, "second");
    }

    #[tokio::test]
    async fn empty_store_returns_empty_results() {
        let store = InMemoryVectorStore::new(4);
        let results = store.nearest_neighbors(&[0.1; 4], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn fewer_than_k_results_is_valid() {
        let store = InMemoryVectorStore::new(2);
        store
            .insert_chunk(&chunk_with(vec![1.0, 0.0], "only"))
            .await
            .unwrap();

        let results = store.nearest_neighbors(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn dimension_mismatch_fails_instead_of_truncating() {
        let store = InMemoryVectorStore::new(3);

        let err = store
            .insert_chunk(&chunk_with(vec![1.0, 0.0], "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        let err = store.nearest_neighbors(&[1.0, 0.0], 3).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
