//! docchat-rag: retrieval-augmented document Q&A with session memory
//!
//! This crate implements a complete RAG pipeline: plain-text ingestion
//! (normalize, chunk, embed, persist), cosine nearest-neighbor retrieval,
//! TTL-bounded conversational session memory, response caching, and
//! prompt-orchestrated answer generation against an Ollama backend.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod memory;
pub mod providers;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use engine::RagEngine;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document},
    session::{Role, Turn},
};
