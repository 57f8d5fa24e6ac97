//! Response memoization
//!
//! Keys are derived from the exact `(session, question)` pair; a question
//! differing by even whitespace is a miss. The cache is purely an
//! optimization: disabling it changes latency and model call counts, never
//! answer content.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::providers::CacheStore;

/// TTL-bounded cache of generated answers
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    enabled: bool,
}

impl ResponseCache {
    /// Create a response cache on top of a TTL key-value store
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: config.ttl(),
            enabled: config.enabled,
        }
    }

    /// Exact-string key: SHA-256 over the verbatim session id and question.
    fn key(session_id: &str, question: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(session_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(question.as_bytes());
        format!("answer:{}", hex::encode(hasher.finalize()))
    }

    /// Look up a cached answer
    pub async fn get(&self, session_id: &str, question: &str) -> Result<Option<String>> {
        if !self.enabled {
            return Ok(None);
        }
        self.store.get(&Self::key(session_id, question)).await
    }

    /// Store a generated answer
    pub async fn put(&self, session_id: &str, question: &str, answer: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.store
            .set(&Self::key(session_id, question), answer.to_string(), self.ttl)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::cache::InMemoryCacheStore;

    fn cache() -> ResponseCache {
        ResponseCache::new(Arc::new(InMemoryCacheStore::new()), &CacheConfig::default())
    }

    #[tokio::test]
    async fn hit_after_put() {
        let cache = cache();
        cache.put("s1", "핵심 내용은?", "요약입니다.").await.unwrap();

        let hit = cache.get("s1", "핵심 내용은?").await.unwrap();
        assert_eq!(hit.as_deref(), Some("요약입니다."));
    }

    #[tokio::test]
    async fn whitespace_difference_is_a_miss() {
        let cache = cache();
        cache.put("s1", "핵심 내용은?", "요약입니다.").await.unwrap();

        assert!(cache.get("s1", "핵심 내용은? ").await.unwrap().is_none());
        assert!(cache.get("s1", " 핵심 내용은?").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_are_session_scoped() {
        let cache = cache();
        cache.put("s1", "질문", "답 1").await.unwrap();

        assert!(cache.get("s2", "질문").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let cache = ResponseCache::new(Arc::new(InMemoryCacheStore::new()), &config);

        cache.put("s1", "질문", "답").await.unwrap();
        assert!(cache.get("s1", "질문").await.unwrap().is_none());
    }
}
