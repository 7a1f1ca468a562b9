//! Text processing module for TTS: chunking and line-break normalization.

pub mod chunker;
mod normalize;

pub use chunker::{DEFAULT_MAX_CHARS, chunk_text, hard_split};
pub use normalize::fix_line_breaks;

use serde::{Deserialize, Serialize};

/// A chunk of text ready for one TTS request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    /// Position of this chunk in the text, starting at 0
    pub index: usize,
    /// The text content
    pub text: &'a str,
}

impl<'a> TextChunk<'a> {
    /// Create a new text chunk.
    pub fn new(index: usize, text: &'a str) -> Self {
        Self { index, text }
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// What to do with a chunk that is still over the limit after chunking
/// (a single word longer than the limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizedTokenPolicy {
    /// Cut the chunk at character positions
    #[default]
    Split,
    /// Refuse the whole request
    Reject,
}

/// Chunk `text` for synthesis and apply the oversized-token policy.
///
/// With [`OversizedTokenPolicy::Reject`], returns the first oversized chunk as
/// `Err` so the caller can report it before any request is made.
pub fn plan_chunks(
    text: &str,
    max_chars: usize,
    policy: OversizedTokenPolicy,
) -> Result<Vec<TextChunk<'_>>, TextChunk<'_>> {
    let mut planned = Vec::new();

    for (index, chunk) in chunk_text(text, max_chars).into_iter().enumerate() {
        if chunk.chars().count() <= max_chars {
            planned.push(chunk);
            continue;
        }

        match policy {
            OversizedTokenPolicy::Split => planned.extend(hard_split(chunk, max_chars)),
            OversizedTokenPolicy::Reject => return Err(TextChunk::new(index, chunk)),
        }
    }

    Ok(planned
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk::new(index, text))
        .collect())
}
