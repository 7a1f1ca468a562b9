//! Errors that end a conversion request.

use speech_client::SpeechError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("No text to convert")]
    EmptyText,

    #[error("Chunk {chunk} has {chars} characters without a break, the limit is {limit}")]
    ChunkTooLong {
        chunk: usize,
        chars: usize,
        limit: usize,
    },

    #[error("Synthesis failed for chunk {chunk} of {total}: {source}")]
    Synthesis {
        chunk: usize,
        total: usize,
        #[source]
        source: SpeechError,
    },

    #[error("Audio for chunk {chunk} of {total} is missing or empty: {}", path.display())]
    ArtifactMissing {
        chunk: usize,
        total: usize,
        path: PathBuf,
    },

    #[error("Failed to decode audio for chunk {chunk} of {total}: {message}")]
    Decode {
        chunk: usize,
        total: usize,
        message: String,
    },

    #[error("Failed to write {}: {message}", path.display())]
    Export { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// 1-based number of the chunk that failed, if the failure belongs to one.
    pub fn chunk(&self) -> Option<usize> {
        match self {
            Self::ChunkTooLong { chunk, .. }
            | Self::Synthesis { chunk, .. }
            | Self::ArtifactMissing { chunk, .. }
            | Self::Decode { chunk, .. } => Some(*chunk),
            _ => None,
        }
    }
}
