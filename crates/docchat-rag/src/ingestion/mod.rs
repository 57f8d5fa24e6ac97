//! Document ingestion: normalize, chunk, embed, persist

pub mod chunker;
pub mod pipeline;

pub use chunker::{clean_text, TextChunker};
pub use pipeline::IngestPipeline;
