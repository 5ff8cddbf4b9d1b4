//! Sliding-window text chunker.
//!
//! Splits extracted document text into overlapping [`TextChunk`]s so that a
//! search term straddling a chunk boundary still appears whole in at least
//! one chunk.
//!
//! # Algorithm
//!
//! 1. Measure the text in characters (Unicode scalar values).
//! 2. Take a window of `chunk_size` characters starting at offset 0.
//! 3. Advance the window start by `chunk_size - overlap`.
//! 4. Stop once a window reaches the end of the text; that last chunk may
//!    be shorter than `chunk_size`.
//!
//! For non-empty text the chunk count is
//! `max(1, ceil((len - overlap) / (chunk_size - overlap)))`.
//!
//! # Example
//!
//! ```rust
//! use policy_desk_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("abcdefghij", 4, 1).unwrap();
//! let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(texts, ["abcd", "defg", "ghij"]);
//! ```

use crate::error::Result;
use crate::models::{ChunkingParams, TextChunk};

/// Split `text` into overlapping windows of `chunk_size` characters.
///
/// Fails with `InvalidChunking` unless `0 <= overlap < chunk_size`.
/// Empty text yields an empty sequence.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<TextChunk>> {
    let params = ChunkingParams::new(chunk_size, overlap)?;

    // Byte offset of every character, plus the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_len {
        let end = (start + params.chunk_size).min(char_len);
        chunks.push(TextChunk {
            index: chunks.len(),
            text: text[bounds[start]..bounds[end]].to_string(),
            start_offset: start,
        });
        if end == char_len {
            break;
        }
        start += params.step();
    }

    Ok(chunks)
}

/// Expected chunk count for a text of `char_len` characters.
pub fn expected_chunk_count(char_len: usize, params: ChunkingParams) -> usize {
    if char_len == 0 {
        return 0;
    }
    let span = char_len.saturating_sub(params.overlap);
    span.div_ceil(params.step()).max(1)
}
