//! RAG orchestrator
//!
//! Ties the pipeline together for both flows. Ingestion runs
//! chunk → embed → store. Answering walks cache check → retrieve →
//! memory load → assemble → generate → persist, where the persist step is
//! best-effort: the caller already holds a valid answer by then.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cache::ResponseCache;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::ChatPrompt;
use crate::ingestion::IngestPipeline;
use crate::memory::{resolve_session_id, SessionMemory};
use crate::providers::{
    CacheStore, EmbeddingProvider, GenerationProvider, ScoredChunk, VectorStoreProvider,
};
use crate::types::{Document, Turn};

/// Outcome of an answered question
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// The answer text
    pub answer: String,
    /// Session the exchange was recorded under
    pub session_id: String,
    /// Whether the answer came from the response cache
    pub cached: bool,
    /// Source fragments that grounded the answer (empty on cache hits)
    pub sources: Vec<ScoredChunk>,
}

/// The RAG engine shared across requests
pub struct RagEngine {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    pipeline: IngestPipeline,
    memory: SessionMemory,
    response_cache: ResponseCache,
    /// Per-session locks serializing the read-modify-write over history.
    /// Cross-session requests never contend.
    session_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RagEngine {
    /// Wire up the engine from its collaborators
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        cache_store: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        config.validate()?;

        if embedder.dimensions() != config.embeddings.dimensions {
            return Err(Error::Config(format!(
                "embedder dimensions ({}) do not match configured dimensions ({})",
                embedder.dimensions(),
                config.embeddings.dimensions
            )));
        }

        let pipeline =
            IngestPipeline::new(&config, Arc::clone(&embedder), Arc::clone(&vector_store))?;
        let memory = SessionMemory::new(Arc::clone(&cache_store), &config.session);
        let response_cache = ResponseCache::new(cache_store, &config.cache);

        Ok(Self {
            config,
            embedder,
            generator,
            vector_store,
            pipeline,
            memory,
            response_cache,
            session_locks: DashMap::new(),
        })
    }

    /// Ingest a document's plain text: chunk, embed, persist
    pub async fn ingest(&self, title: &str, raw_text: &str) -> Result<Document> {
        self.pipeline.ingest(title, raw_text).await
    }

    /// Answer a question within a session
    pub async fn answer(
        &self,
        session_id: Option<&str>,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<AnswerOutcome> {
        if question.trim().is_empty() {
            return Err(Error::invalid_request("question must not be empty"));
        }

        let session_id = resolve_session_id(session_id);
        let top_k = top_k.unwrap_or(self.config.retrieval.top_k);

        // Cache check: a hit short-circuits everything downstream.
        match self.response_cache.get(&session_id, question).await {
            Ok(Some(answer)) => {
                tracing::info!(session = %session_id, "Answer served from cache");
                return Ok(AnswerOutcome {
                    answer,
                    session_id,
                    cached: true,
                    sources: Vec::new(),
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Response cache lookup failed, treating as miss: {}", e),
        }

        // Retrieve. Absence of results is not a failure; it becomes an
        // explicit no-context marker in the prompt.
        let query_embedding = self.embedder.embed(question).await?;
        let sources = self.retrieve(&query_embedding, top_k).await?;
        tracing::info!(
            session = %session_id,
            chunks = sources.len(),
            "Retrieved context"
        );

        // The history read-modify-write races under concurrent requests on
        // one session, so the rest of the flow is serialized per session.
        let lock = self.session_lock(&session_id);
        let answer = {
            let _guard = lock.lock().await;
            self.generate_and_persist(&session_id, question, &sources).await
        };
        drop(lock);

        // The entry is removed only while no request holds the lock, so two
        // requests can never see different locks for one session. Sessions
        // themselves are reclaimed by TTL in the store, not here.
        self.session_locks
            .remove_if(&session_id, |_, entry| Arc::strong_count(entry) == 1);

        Ok(AnswerOutcome {
            answer: answer?,
            session_id,
            cached: false,
            sources,
        })
    }

    /// Load history, assemble, generate, and persist. Caller must hold the
    /// session lock.
    async fn generate_and_persist(
        &self,
        session_id: &str,
        question: &str,
        sources: &[ScoredChunk],
    ) -> Result<String> {
        let history = match self.memory.load_history(session_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Failed to load session history, continuing without: {}", e);
                Vec::new()
            }
        };

        let prompt = ChatPrompt::assemble(&history, sources, question);
        let rendered = prompt.render();

        let answer = self.generator.complete(&rendered.system, &rendered.user).await?;
        if answer.trim().is_empty() {
            return Err(Error::GenerationEmpty);
        }

        // Persist is best-effort: the user already has a valid answer.
        let turns = [Turn::user(question), Turn::assistant(answer.clone())];
        if let Err(e) = self.memory.append_turns(session_id, &turns).await {
            tracing::warn!("Failed to persist session history: {}", e);
        }
        if let Err(e) = self.response_cache.put(session_id, question, &answer).await {
            tracing::warn!("Failed to store answer in cache: {}", e);
        }

        Ok(answer)
    }

    /// Nearest-neighbor search with one retry on transient failure
    /// (retrieval is idempotent; generation never retries).
    async fn retrieve(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        match self.vector_store.nearest_neighbors(query, top_k).await {
            Ok(results) => Ok(results),
            Err(e @ Error::InvalidRequest(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Retrieval failed, retrying once: {}", e);
                self.vector_store.nearest_neighbors(query, top_k).await
            }
        }
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.session_locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Engine configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Health of the external collaborators
    pub async fn health_check(&self) -> Result<bool> {
        let embedder_ok = self.embedder.health_check().await.unwrap_or(false);
        let generator_ok = self.generator.health_check().await.unwrap_or(false);
        let store_ok = self.vector_store.health_check().await.unwrap_or(false);
        Ok(embedder_ok && generator_ok && store_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;
    use crate::generation::NO_CONTEXT_MARKER;
    use crate::providers::cache::InMemoryCacheStore;
    use crate::providers::local::InMemoryVectorStore;
    use crate::types::Role;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DIMS: usize = 8;

    /// Embeds text as a unit vector keyed off its first character, so
    /// related texts retrieve each other.
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0; DIMS];
            let slot = text.chars().next().map(|c| c as usize % DIMS).unwrap_or(0);
            v[slot] = 1.0;
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            DIMS
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Counts calls and records the prompts it was given
    struct StubGenerator {
        calls: AtomicUsize,
        prompts: SyncMutex<Vec<String>>,
        reply: String,
    }

    impl StubGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                prompts: SyncMutex::new(Vec::new()),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl GenerationProvider for StubGenerator {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(user.to_string());
            Ok(self.reply.clone())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    struct Harness {
        engine: RagEngine,
        generator: Arc<StubGenerator>,
        cache_store: Arc<InMemoryCacheStore>,
    }

    fn harness_with(config: RagConfig, reply: &str) -> Harness {
        let mut config = config;
        config.embeddings.dimensions = DIMS;

        let generator = StubGenerator::new(reply);
        let cache_store = Arc::new(InMemoryCacheStore::new());
        let engine = RagEngine::new(
            config,
            Arc::new(StubEmbedder),
            generator.clone(),
            Arc::new(InMemoryVectorStore::new(DIMS)),
            cache_store.clone(),
        )
        .unwrap();

        Harness {
            engine,
            generator,
            cache_store,
        }
    }

    fn harness() -> Harness {
        harness_with(RagConfig::default(), "문서에 따르면 관련 기준이 정의되어 있습니다.")
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_any_call() {
        let h = harness();

        let err = h.engine.answer(None, "   ", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_store_still_generates_with_no_context_marker() {
        let h = harness();

        let outcome = h
            .engine
            .answer(None, "이 문서의 핵심 내용은?", None)
            .await
            .unwrap();

        assert!(!outcome.cached);
        assert!(outcome.sources.is_empty());
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 1);

        let prompts = h.generator.prompts.lock();
        assert!(prompts[0].contains(NO_CONTEXT_MARKER));
    }

    #[tokio::test]
    async fn ingested_text_is_retrieved_into_the_prompt() {
        let h = harness();

        let statute =
            "제1조 목적 이 법은 소방 시설의 설치 기준을 정함을 목적으로 한다. 점검 주기는 연 1회로 한다.";
        h.engine.ingest("소방법.txt", statute).await.unwrap();

        // Same leading character as the statute text, so the stub embedder
        // lands both in the same similarity slot.
        let outcome = h.engine.answer(None, "제1조의 목적은?", None).await.unwrap();

        assert!(!outcome.sources.is_empty());
        let prompts = h.generator.prompts.lock();
        assert!(prompts[0].contains("소방 시설의 설치 기준"));
    }

    #[tokio::test]
    async fn identical_question_hits_cache_with_zero_model_calls() {
        let h = harness();

        let first = h
            .engine
            .answer(Some("s1"), "핵심 내용은?", None)
            .await
            .unwrap();
        let second = h
            .engine
            .answer(Some("s1"), "핵심 내용은?", None)
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.answer, second.answer);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_is_transparent_to_answer_content() {
        let reply = "항상 같은 답변입니다.";

        let with_cache = harness_with(RagConfig::default(), reply);
        let mut no_cache_config = RagConfig::default();
        no_cache_config.cache.enabled = false;
        let without_cache = harness_with(no_cache_config, reply);

        let question = "동일한 질문입니다?";
        let a1 = with_cache.engine.answer(None, question, None).await.unwrap();
        let a2 = with_cache.engine.answer(None, question, None).await.unwrap();
        let b1 = without_cache.engine.answer(None, question, None).await.unwrap();
        let b2 = without_cache.engine.answer(None, question, None).await.unwrap();

        // Same content either way; only the call counts differ.
        assert_eq!(a1.answer, b1.answer);
        assert_eq!(a2.answer, b2.answer);
        assert_eq!(with_cache.generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(without_cache.generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn session_history_is_bounded_to_last_three_exchanges() {
        let h = harness();

        for i in 1..=4 {
            // Distinct questions so the cache never short-circuits.
            h.engine
                .answer(Some("s1"), &format!("질문 번호 {}?", i), None)
                .await
                .unwrap();
        }

        let store: Arc<dyn CacheStore> = h.cache_store.clone();
        let memory = SessionMemory::new(store, &h.engine.config().session);
        let history = memory.load_history("s1").await.unwrap();

        assert_eq!(history.len(), 6);
        assert_eq!(history[0].content, "질문 번호 2?");
    }

    #[tokio::test]
    async fn blank_completion_surfaces_generation_empty() {
        let h = harness_with(RagConfig::default(), "   ");

        let err = h.engine.answer(None, "질문?", None).await.unwrap_err();
        assert!(matches!(err, Error::GenerationEmpty));
    }

    #[tokio::test]
    async fn sessions_do_not_share_cached_answers() {
        let h = harness();

        h.engine.answer(Some("a"), "질문?", None).await.unwrap();
        let other = h.engine.answer(Some("b"), "질문?", None).await.unwrap();

        assert!(!other.cached);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn lock_table_does_not_grow_with_session_churn() {
        let h = harness();

        for i in 0..50 {
            h.engine
                .answer(Some(&format!("session-{}", i)), "질문?", None)
                .await
                .unwrap();
        }

        // Every request released its lock, so every entry was reclaimed.
        assert!(h.engine.session_locks.is_empty());
    }

    /// Answers with the question echoed back, yielding mid-completion so a
    /// concurrent request on the same session gets a chance to interleave.
    struct EchoGenerator;

    #[async_trait]
    impl GenerationProvider for EchoGenerator {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            tokio::task::yield_now().await;
            let question = user
                .split("[질문]\n")
                .nth(1)
                .and_then(|rest| rest.lines().next())
                .unwrap_or("")
                .to_string();
            tokio::task::yield_now().await;
            Ok(format!("답변: {}", question))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-model"
        }
    }

    #[tokio::test]
    async fn concurrent_requests_on_one_session_keep_exchanges_paired() {
        let mut config = RagConfig::default();
        config.embeddings.dimensions = DIMS;

        let cache_store = Arc::new(InMemoryCacheStore::new());
        let engine = RagEngine::new(
            config,
            Arc::new(StubEmbedder),
            Arc::new(EchoGenerator),
            Arc::new(InMemoryVectorStore::new(DIMS)),
            cache_store.clone(),
        )
        .unwrap();

        let (a, b) = tokio::join!(
            engine.answer(Some("s1"), "첫 번째 질문?", None),
            engine.answer(Some("s1"), "두 번째 질문?", None),
        );
        a.unwrap();
        b.unwrap();

        let store: Arc<dyn CacheStore> = cache_store;
        let memory = SessionMemory::new(store, &engine.config().session);
        let history = memory.load_history("s1").await.unwrap();

        // Four turns, and each answer sits directly after its own question.
        assert_eq!(history.len(), 4);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].content, format!("답변: {}", pair[0].content));
        }
    }
}
