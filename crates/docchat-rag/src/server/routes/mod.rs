//! API routes for the RAG server

pub mod chat;
pub mod ingest;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/ingest",
            post(ingest::ingest_text).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/ingest/upload",
            post(ingest::ingest_upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/chat", post(chat::chat))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "docchat-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented document Q&A with session memory",
        "endpoints": {
            "POST /api/ingest": "Ingest raw text ({title, text})",
            "POST /api/ingest/upload": "Ingest plain-text files (multipart)",
            "POST /api/chat": "Ask a question ({session_id?, question})",
            "GET /api/info": "This document"
        }
    }))
}
