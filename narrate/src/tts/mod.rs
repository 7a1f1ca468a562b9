//! One synthesis call per chunk, with its audio stored in a scoped temp file.

use speech_client::{Model, SpeechError, SpeechProvider, SpeechRequest, Voice};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Why a single synthesis call produced no usable audio.
#[derive(Debug, Error)]
pub enum SynthesisFailure {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("audio file {} is missing or empty", path.display())]
    ArtifactMissing { path: PathBuf },

    /// The audio arrived but could not be written to local disk.
    #[error("failed to store synthesized audio: {0}")]
    Storage(#[source] std::io::Error),
}

/// Audio of one chunk on disk. The file is deleted when this is dropped.
#[derive(Debug)]
pub struct SpeechArtifact {
    file: NamedTempFile,
}

impl SpeechArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Wraps a speech provider so each call lands in its own temp file.
pub struct SynthesisClient<'a> {
    provider: &'a dyn SpeechProvider,
    /// Directory for chunk files (system temp dir when None)
    temp_dir: Option<PathBuf>,
}

impl<'a> SynthesisClient<'a> {
    pub fn new(provider: &'a dyn SpeechProvider, temp_dir: Option<PathBuf>) -> Self {
        Self { provider, temp_dir }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Synthesize `text` exactly once and store the returned audio.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: Voice,
        model: Model,
    ) -> Result<SpeechArtifact, SynthesisFailure> {
        let audio = self
            .provider
            .synthesize(SpeechRequest::new(text, voice, model))
            .await?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("narrate-chunk-").suffix(".mp3");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(SynthesisFailure::Storage)?;

        file.write_all(&audio.bytes).map_err(SynthesisFailure::Storage)?;
        file.flush().map_err(SynthesisFailure::Storage)?;

        let artifact = SpeechArtifact { file };
        let stored = std::fs::metadata(artifact.path())
            .map(|m| m.len())
            .unwrap_or(0);
        if stored == 0 {
            return Err(SynthesisFailure::ArtifactMissing {
                path: artifact.path().to_path_buf(),
            });
        }

        log::debug!(
            "{} returned {} bytes for {} chars -> {}",
            self.provider.name(),
            stored,
            text.chars().count(),
            artifact.path().display()
        );

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech_client::MockProvider;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_artifact_holds_audio() {
        let provider = MockProvider::echo();
        let client = SynthesisClient::new(&provider, None);

        let artifact = client
            .synthesize("Hallo Welt", Voice::Nova, Model::Tts1)
            .await
            .unwrap();
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"Hallo Welt");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_artifact_deleted_on_drop() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::echo();
        let client = SynthesisClient::new(&provider, Some(dir.path().to_path_buf()));

        let artifact = client
            .synthesize("text", Voice::Alloy, Model::Tts1)
            .await
            .unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_empty_audio_is_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::returns_empty();
        let client = SynthesisClient::new(&provider, Some(dir.path().to_path_buf()));

        let err = client
            .synthesize("text", Voice::Alloy, Model::Tts1)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisFailure::ArtifactMissing { .. }));
        // The empty file is cleaned up with the error path too
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_temp_dir_is_storage_failure() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::echo();
        let client = SynthesisClient::new(&provider, Some(dir.path().join("missing")));

        let err = client
            .synthesize("text", Voice::Alloy, Model::Tts1)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisFailure::Storage(_)));
        // The provider was still called once; only the local write failed
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let provider = MockProvider::fails_on_call(1, SpeechError::Timeout { seconds: 30 });
        let client = SynthesisClient::new(&provider, None);

        let err = client
            .synthesize("text", Voice::Alloy, Model::Tts1)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }
}
