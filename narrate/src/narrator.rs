//! Sequential narration: chunk, synthesize in order, concatenate, export.

use crate::audio::{self, AudioCodec, CombinedAudio};
use crate::error::ConvertError;
use crate::text::{DEFAULT_MAX_CHARS, OversizedTokenPolicy, TextChunk, plan_chunks};
use crate::tts::{SpeechArtifact, SynthesisClient, SynthesisFailure};
use speech_client::{MAX_INPUT_CHARS, Model, SpeechProvider, Voice};
use std::path::{Path, PathBuf};

/// Everything that varies per conversion.
#[derive(Debug, Clone, Copy)]
pub struct NarrationRequest<'a> {
    pub text: &'a str,
    pub voice: Voice,
    pub model: Model,
}

/// Settings shared by all conversions of one run.
#[derive(Debug, Clone)]
pub struct NarrationOptions {
    /// Maximum characters per synthesis call
    pub max_chunk_chars: usize,
    /// Handling of words longer than `max_chunk_chars`
    pub oversized_tokens: OversizedTokenPolicy,
    /// Directory for per-chunk audio files (system temp dir when None)
    pub temp_dir: Option<PathBuf>,
}

impl Default for NarrationOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHARS,
            oversized_tokens: OversizedTokenPolicy::default(),
            temp_dir: None,
        }
    }
}

/// Chunks finished out of the total for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completed share in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Drives synthesis calls one after another and assembles the result.
pub struct Narrator<'a> {
    client: SynthesisClient<'a>,
    codec: &'a dyn AudioCodec,
    options: NarrationOptions,
}

impl<'a> Narrator<'a> {
    pub fn new(
        provider: &'a dyn SpeechProvider,
        codec: &'a dyn AudioCodec,
        options: NarrationOptions,
    ) -> Self {
        let client = SynthesisClient::new(provider, options.temp_dir.clone());
        Self {
            client,
            codec,
            options,
        }
    }

    /// Convert the request text into one audio file.
    ///
    /// Text within the chunk limit goes out in a single call and the returned
    /// MP3 is copied as is. Longer text is chunked, every chunk is decoded and
    /// appended in text order, and the result is re-encoded once. The first
    /// failing chunk aborts the request; later chunks are never sent.
    ///
    /// `on_progress` sees `completed / total` after each chunk. It reaches
    /// `total` only once the output file has been written.
    pub async fn narrate(
        &self,
        request: &NarrationRequest<'_>,
        destination: Option<&Path>,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<PathBuf, ConvertError> {
        if request.text.trim().is_empty() {
            return Err(ConvertError::EmptyText);
        }

        // Chunks never exceed what one backend request accepts
        let max_chars = self.options.max_chunk_chars.clamp(1, MAX_INPUT_CHARS);
        let char_count = request.text.chars().count();

        log::info!(
            "narrating {} chars with {} (voice={}, model={}, limit={})",
            char_count,
            self.client.provider_name(),
            request.voice,
            request.model,
            max_chars
        );

        if char_count <= max_chars {
            let chunk = TextChunk::new(0, request.text);
            let artifact = self.synthesize_chunk(&chunk, 1, request).await?;
            let output = audio::persist_artifact(artifact.path(), destination)?;
            on_progress(Progress {
                completed: 1,
                total: 1,
            });
            return Ok(output);
        }

        let chunks = plan_chunks(request.text, max_chars, self.options.oversized_tokens).map_err(
            |chunk| ConvertError::ChunkTooLong {
                chunk: chunk.index + 1,
                chars: chunk.char_count(),
                limit: max_chars,
            },
        )?;
        let total = chunks.len();
        log::info!("split text into {} chunks", total);

        let mut combined = CombinedAudio::new();
        for chunk in &chunks {
            let number = chunk.index + 1;
            let artifact = self.synthesize_chunk(chunk, total, request).await?;

            let buffer = self
                .codec
                .decode(artifact.path())
                .map_err(|e| ConvertError::Decode {
                    chunk: number,
                    total,
                    message: format!("{:#}", e),
                })?;
            drop(artifact);

            log::debug!("chunk {}/{}: {} ms of audio", number, total, buffer.duration_ms());

            combined.append(buffer).map_err(|e| ConvertError::Decode {
                chunk: number,
                total,
                message: format!("{:#}", e),
            })?;

            if number < total {
                on_progress(Progress {
                    completed: number,
                    total,
                });
            }
        }

        let output = audio::write_output(self.codec, &combined, destination)?;
        drop(combined);

        on_progress(Progress {
            completed: total,
            total,
        });
        Ok(output)
    }

    async fn synthesize_chunk(
        &self,
        chunk: &TextChunk<'_>,
        total: usize,
        request: &NarrationRequest<'_>,
    ) -> Result<SpeechArtifact, ConvertError> {
        let number = chunk.index + 1;
        log::debug!(
            "synthesizing chunk {}/{} ({} chars)",
            number,
            total,
            chunk.char_count()
        );

        self.client
            .synthesize(chunk.text, request.voice, request.model)
            .await
            .map_err(|failure| {
                log::warn!("chunk {}/{} failed: {}", number, total, failure);
                match failure {
                    SynthesisFailure::Speech(source) => ConvertError::Synthesis {
                        chunk: number,
                        total,
                        source,
                    },
                    SynthesisFailure::ArtifactMissing { path } => ConvertError::ArtifactMissing {
                        chunk: number,
                        total,
                        path,
                    },
                    SynthesisFailure::Storage(e) => ConvertError::Io(e),
                }
            })
    }
}
