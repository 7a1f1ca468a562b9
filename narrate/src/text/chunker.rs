//! Text chunking for TTS requests with a per-request character limit.

use regex::Regex;
use std::sync::OnceLock;

/// Default maximum chunk size in characters (the backend's per-request limit).
pub const DEFAULT_MAX_CHARS: usize = 4096;

/// Alternating runs of whitespace and non-whitespace.
static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\s+|\S+").expect("token pattern should compile"))
}

/// Split text into whitespace and non-whitespace runs.
///
/// Every character of `text` lands in exactly one token.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    token_regex().find_iter(text).map(|m| m.as_str())
}

/// Split text into chunks of at most `max_chars` characters.
///
/// # Arguments
/// * `text` - The text to chunk
/// * `max_chars` - Maximum chunk size in characters (default: 4096)
///
/// # Returns
/// Slices of `text` that concatenate back to `text` exactly. Chunks only end on
/// token boundaries, so a single word longer than `max_chars` becomes its own
/// oversized chunk instead of being cut.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut end = 0;
    let mut current_chars = 0;

    for token in tokenize(text) {
        let token_chars = token.chars().count();

        if current_chars > 0 && current_chars + token_chars > max_chars {
            chunks.push(&text[start..end]);
            start = end;
            current_chars = 0;
        }

        end += token.len();
        current_chars += token_chars;
    }

    // Don't forget the last chunk
    if end > start {
        chunks.push(&text[start..end]);
    }

    chunks
}

/// Hard split text at character positions (last resort for oversized chunks).
pub fn hard_split(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}
