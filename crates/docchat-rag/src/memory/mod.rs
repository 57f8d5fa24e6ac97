//! Session-scoped conversational memory
//!
//! History lives in the TTL key-value collaborator, not in process state, so
//! a restart does not erase active conversations when an external store is
//! configured.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::providers::CacheStore;
use crate::types::Turn;

/// Sentinel session shared by callers that supply no identifier
pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Resolve an optional caller-supplied session id to a concrete one
pub fn resolve_session_id(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => ANONYMOUS_SESSION.to_string(),
    }
}

/// Bounded per-session conversation history
pub struct SessionMemory {
    store: Arc<dyn CacheStore>,
    /// Most recent turns retained (sliding window)
    max_turns: usize,
    /// Session TTL, refreshed on every write
    ttl: Duration,
}

impl SessionMemory {
    /// Create a session memory manager on top of a TTL key-value store
    pub fn new(store: Arc<dyn CacheStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            max_turns: config.max_turns,
            ttl: config.ttl(),
        }
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    /// Load the history for a session. A missing session is an empty
    /// history, not an error.
    pub async fn load_history(&self, session_id: &str) -> Result<Vec<Turn>> {
        let key = Self::key(session_id);

        match self.store.get(&key).await? {
            Some(payload) => {
                let turns: Vec<Turn> = serde_json::from_str(&payload)
                    .map_err(|e| Error::cache_store(format!("corrupt session payload: {}", e)))?;
                Ok(turns)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Append turns to a session, trimming to the most recent `max_turns`
    /// before persisting. The write refreshes the session TTL, so active
    /// sessions never expire mid-conversation.
    pub async fn append_turns(&self, session_id: &str, new_turns: &[Turn]) -> Result<()> {
        let mut turns = self.load_history(session_id).await?;
        turns.extend_from_slice(new_turns);

        if turns.len() > self.max_turns {
            turns.drain(..turns.len() - self.max_turns);
        }

        let payload = serde_json::to_string(&turns)?;
        self.store.set(&Self::key(session_id), payload, self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::providers::cache::InMemoryCacheStore;
    use crate::types::Role;

    fn memory() -> SessionMemory {
        SessionMemory::new(Arc::new(InMemoryCacheStore::new()), &SessionConfig::default())
    }

    #[tokio::test]
    async fn missing_session_is_empty_history() {
        let memory = memory();
        let history = memory.load_history("nobody").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn history_is_bounded_to_last_n_turns() {
        let memory = memory();

        // 4 exchanges = 8 turns, window of 6 keeps the last 3 exchanges.
        for i in 1..=4 {
            memory
                .append_turns(
                    "s1",
                    &[
                        Turn::user(format!("질문 {}", i)),
                        Turn::assistant(format!("답변 {}", i)),
                    ],
                )
                .await
                .unwrap();
        }

        let history = memory.load_history("s1").await.unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].content, "질문 2");
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[5].content, "답변 4");
        assert_eq!(history[5].role, Role::Assistant);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let memory = memory();
        memory.append_turns("a", &[Turn::user("안녕")]).await.unwrap();

        assert_eq!(memory.load_history("a").await.unwrap().len(), 1);
        assert!(memory.load_history("b").await.unwrap().is_empty());
    }

    #[test]
    fn blank_session_id_resolves_to_anonymous() {
        assert_eq!(resolve_session_id(None), ANONYMOUS_SESSION);
        assert_eq!(resolve_session_id(Some("")), ANONYMOUS_SESSION);
        assert_eq!(resolve_session_id(Some("  ")), ANONYMOUS_SESSION);
        assert_eq!(resolve_session_id(Some("user-1")), "user-1");
    }
}
