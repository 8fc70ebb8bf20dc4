//! Fixed-size windowing of cleaned text for context-limited prompts.
//!
//! Chunks are contiguous, non-overlapping windows measured in characters (Unicode scalar
//! values, never bytes, so a window can't split a code point). Concatenating the chunk contents
//! in ordinal order reproduces the input exactly. Chunk boundaries carry no semantic meaning;
//! the provider calls made per chunk depend on `ceil(chars / max_chunk_size)` being exact.

use std::ops::Range;

use super::types::ChunkingError;

/// Default window size observed to keep strict-extraction prompts within small local contexts.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// One bounded slice of cleaned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Zero-based position of the chunk within the document.
    pub index: usize,
    /// Character offsets (half-open) covered by this chunk.
    pub span: Range<usize>,
    /// Chunk contents.
    pub content: String,
}

/// Partition `text` into windows of at most `max_chunk_size` characters.
///
/// Empty input produces zero chunks; otherwise no chunk is empty.
pub fn chunk(text: &str, max_chunk_size: usize) -> Result<Vec<TextChunk>, ChunkingError> {
    if max_chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let mut chunks = Vec::new();
    let mut start_byte = 0;
    let mut start_char = 0;
    let mut chars_in_window = 0;

    for (byte_offset, _) in text.char_indices() {
        if chars_in_window == max_chunk_size {
            chunks.push(TextChunk {
                index: chunks.len(),
                span: start_char..start_char + chars_in_window,
                content: text[start_byte..byte_offset].to_string(),
            });
            start_byte = byte_offset;
            start_char += chars_in_window;
            chars_in_window = 0;
        }
        chars_in_window += 1;
    }

    if chars_in_window > 0 {
        chunks.push(TextChunk {
            index: chunks.len(),
            span: start_char..start_char + chars_in_window,
            content: text[start_byte..].to_string(),
        });
    }

    tracing::trace!(
        chunks = chunks.len(),
        max_chunk_size,
        "Partitioned text into chunks"
    );
    Ok(chunks)
}

/// Number of chunks [`chunk`] will produce for `text`.
pub fn expected_chunk_count(text: &str, max_chunk_size: usize) -> usize {
    if max_chunk_size == 0 {
        return 0;
    }
    text.chars().count().div_ceil(max_chunk_size)
}
