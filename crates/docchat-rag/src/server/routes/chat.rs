//! Chat endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse, SourceSnippet};

/// POST /api/chat - answer a question within a session
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let start = Instant::now();
    tracing::info!("Question: \"{}\"", request.question);

    let outcome = state
        .engine()
        .answer(
            request.session_id.as_deref(),
            &request.question,
            request.top_k,
        )
        .await?;

    let sources = outcome
        .sources
        .iter()
        .map(|s| SourceSnippet {
            chunk_id: s.chunk.id,
            document_id: s.chunk.document_id,
            content: s.chunk.content.clone(),
            similarity: s.similarity,
        })
        .collect();

    tracing::info!(
        "Answered in {}ms (cached: {})",
        start.elapsed().as_millis(),
        outcome.cached
    );

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        session_id: outcome.session_id,
        cached: outcome.cached,
        sources,
        timestamp: Utc::now(),
    }))
}
