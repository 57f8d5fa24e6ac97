//! Core data types

pub mod document;
pub mod query;
pub mod response;
pub mod session;

pub use document::{Chunk, Document};
pub use query::{ChatRequest, IngestRequest};
pub use response::{ChatResponse, IngestResponse, SourceSnippet};
pub use session::{Role, Turn};
