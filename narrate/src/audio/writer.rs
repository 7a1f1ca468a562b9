//! Final export of the narration file.

use super::buffer::CombinedAudio;
use super::codec::AudioCodec;
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Encode the combined audio into a new MP3 and return its path.
///
/// Writes to `destination` when given, otherwise to a fresh `narration-*.mp3`
/// in the system temp directory that is kept after the process exits. The
/// encoder writes into a staging file next to the target, which only replaces
/// the target once encoding succeeded.
pub fn write_output(
    codec: &dyn AudioCodec,
    audio: &CombinedAudio,
    destination: Option<&Path>,
) -> Result<PathBuf, ConvertError> {
    let staged = stage_output(destination)?;
    let reported = destination.unwrap_or(staged.path()).to_path_buf();

    log::info!(
        "encoding {} segments ({} ms) to {}",
        audio.segments(),
        audio.duration_ms(),
        reported.display()
    );

    codec
        .encode(audio, staged.path())
        .map_err(|e| ConvertError::Export {
            path: reported,
            message: format!("{:#}", e),
        })?;

    finish_output(staged, destination)
}

/// Copy an already encoded artifact to the output location unchanged.
pub fn persist_artifact(source: &Path, destination: Option<&Path>) -> Result<PathBuf, ConvertError> {
    let staged = stage_output(destination)?;

    std::fs::copy(source, staged.path()).map_err(|e| ConvertError::Export {
        path: destination.unwrap_or(staged.path()).to_path_buf(),
        message: e.to_string(),
    })?;

    finish_output(staged, destination)
}

/// Create the staging file. Dropping it without `finish_output` deletes it.
fn stage_output(destination: Option<&Path>) -> Result<NamedTempFile, ConvertError> {
    let mut builder = tempfile::Builder::new();
    builder.suffix(".mp3");

    let staged = match destination {
        Some(path) => {
            let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(parent) => {
                    std::fs::create_dir_all(parent)?;
                    parent
                }
                None => Path::new("."),
            };
            builder.prefix(".narrate-").tempfile_in(dir)?
        }
        None => builder.prefix("narration-").tempfile()?,
    };
    Ok(staged)
}

fn finish_output(
    staged: NamedTempFile,
    destination: Option<&Path>,
) -> Result<PathBuf, ConvertError> {
    match destination {
        Some(path) => {
            staged.persist(path).map_err(|e| e.error)?;
            Ok(path.to_path_buf())
        }
        None => {
            let (_, path) = staged.keep().map_err(|e| e.error)?;
            Ok(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioBuffer;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct RawCodec;

    impl AudioCodec for RawCodec {
        fn decode(&self, _path: &Path) -> anyhow::Result<AudioBuffer> {
            unreachable!()
        }

        fn encode(&self, audio: &CombinedAudio, output_path: &Path) -> anyhow::Result<()> {
            std::fs::write(output_path, audio.to_le_bytes())?;
            Ok(())
        }
    }

    /// Writes a partial file, then fails. Remembers where it wrote.
    #[derive(Default)]
    struct BrokenCodec {
        written_to: RefCell<Option<PathBuf>>,
    }

    impl AudioCodec for BrokenCodec {
        fn decode(&self, _path: &Path) -> anyhow::Result<AudioBuffer> {
            unreachable!()
        }

        fn encode(&self, _audio: &CombinedAudio, output_path: &Path) -> anyhow::Result<()> {
            std::fs::write(output_path, b"partial")?;
            *self.written_to.borrow_mut() = Some(output_path.to_path_buf());
            anyhow::bail!("encoder exploded")
        }
    }

    fn one_segment() -> CombinedAudio {
        let mut audio = CombinedAudio::new();
        audio.append(AudioBuffer::new(24000, 1, vec![1, 2])).unwrap();
        audio
    }

    #[test]
    fn test_write_to_destination_creates_parents() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nested").join("out.mp3");

        let path = write_output(&RawCodec, &one_segment(), Some(&dest)).unwrap();
        assert_eq!(path, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![1, 0, 2, 0]);
    }

    #[test]
    fn test_write_without_destination_keeps_temp_file() {
        let path = write_output(&RawCodec, &one_segment(), None).unwrap();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with(".mp3"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_encoder_failure_is_export_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.mp3");
        let err = write_output(&BrokenCodec::default(), &one_segment(), Some(&dest)).unwrap_err();
        assert!(matches!(err, ConvertError::Export { ref path, .. } if *path == dest));
        assert!(err.to_string().contains("encoder exploded"));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_encoder_failure_keeps_existing_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.mp3");
        std::fs::write(&dest, b"previous narration").unwrap();

        let err = write_output(&BrokenCodec::default(), &one_segment(), Some(&dest));
        assert!(err.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"previous narration");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_encoder_failure_without_destination_leaves_no_file() {
        let codec = BrokenCodec::default();
        let err = write_output(&codec, &one_segment(), None).unwrap_err();

        let staged = codec.written_to.borrow().clone().unwrap();
        assert!(matches!(err, ConvertError::Export { ref path, .. } if *path == staged));
        assert!(!staged.exists());
    }

    #[test]
    fn test_write_replaces_existing_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.mp3");
        std::fs::write(&dest, b"old").unwrap();

        write_output(&RawCodec, &one_segment(), Some(&dest)).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), vec![1, 0, 2, 0]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_persist_artifact_copies_bytes() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("chunk.mp3");
        std::fs::write(&source, b"ID3 fake mp3").unwrap();
        let dest = dir.path().join("final.mp3");

        let path = persist_artifact(&source, Some(&dest)).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"ID3 fake mp3");
        assert!(source.exists());
    }
}
