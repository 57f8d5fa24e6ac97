//! Text normalization and chunking
//!
//! Splitting prefers the largest semantic unit that fits: statute clause
//! markers first, then paragraph breaks, newlines, spaces, and finally a hard
//! cut. Sizes are counted in characters, not bytes, so Korean text chunks the
//! same way as ASCII.

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

/// Separator priority, largest semantic unit first. "\n제" starts a Korean
/// statute clause (제1조, 제2조, ...).
const SEPARATORS: &[&str] = &["\n제", "\n\n", "\n", " "];

/// Strip control characters and collapse whitespace runs.
///
/// Keeps single spaces and up to one blank line; everything else
/// non-printable is dropped so the token budget goes to real content.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_spaces = 0usize;
    let mut pending_newlines = 0usize;

    for ch in text.chars() {
        match ch {
            '\r' => {} // CRLF folds into the following LF
            '\n' => {
                pending_spaces = 0;
                pending_newlines += 1;
            }
            ' ' | '\t' => pending_spaces += 1,
            c if c.is_control() => {}
            c => {
                if pending_newlines > 0 {
                    out.push('\n');
                    if pending_newlines > 1 {
                        out.push('\n');
                    }
                } else if pending_spaces > 0 && !out.is_empty() {
                    out.push(' ');
                }
                pending_spaces = 0;
                pending_newlines = 0;
                out.push(c);
            }
        }
    }

    out
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    overlap: usize,
    /// Fragments below this length are dropped as noise
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker. `overlap >= chunk_size` cannot make forward
    /// progress and is rejected up front.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be strictly less than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            min_size: 10,
        })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        let mut chunker = Self::new(config.chunk_size, config.chunk_overlap)?;
        chunker.min_size = config.min_chunk_size;
        Ok(chunker)
    }

    /// Split text into overlapping fragments.
    ///
    /// Pure and deterministic: the same input always yields the same
    /// sequence. Empty input yields an empty sequence; input shorter than
    /// the chunk size yields a single chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let cleaned = clean_text(text);
        let chars: Vec<char> = cleaned.chars().collect();

        if chars.is_empty() {
            return Vec::new();
        }

        if chars.len() <= self.chunk_size {
            return if chars.len() >= self.min_size {
                vec![cleaned]
            } else {
                Vec::new()
            };
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let window_end = (start + self.chunk_size).min(chars.len());
            let end = if window_end < chars.len() {
                self.find_break(&chars, start, window_end)
            } else {
                window_end
            };

            let piece: String = chars[start..end].iter().collect();
            if end - start >= self.min_size {
                chunks.push(piece);
            }

            if end >= chars.len() {
                break;
            }

            // Next chunk re-reads the trailing `overlap` characters so
            // cross-boundary context survives the split.
            start = end - self.overlap;
        }

        chunks
    }

    /// Pick the break position inside `[start, limit)`, preferring the
    /// highest-priority separator whose position still guarantees forward
    /// progress. Falls back to a hard cut at the window limit.
    fn find_break(&self, chars: &[char], start: usize, limit: usize) -> usize {
        // A break at or before start + overlap would make the next chunk
        // start at or before this one.
        let min_break = start + self.overlap + 1;

        for sep in SEPARATORS {
            let sep_chars: Vec<char> = sep.chars().collect();
            if let Some(pos) = rfind_seq(&chars[start..limit], &sep_chars) {
                let pos = start + pos;
                // Clause markers open the next chunk; whitespace separators
                // close this one.
                let break_at = if *sep == "\n제" {
                    pos
                } else {
                    pos + sep_chars.len()
                };
                if break_at >= min_break && break_at < limit {
                    return break_at;
                }
            }
        }

        limit
    }
}

/// Find the last occurrence of `needle` in `haystack`, by position
fn rfind_seq(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| &haystack[i..i + needle.len()] == needle)
}
