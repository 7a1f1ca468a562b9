//! Audio decoding and MP3 encoding using FFmpeg.

use super::buffer::{AudioBuffer, CombinedAudio};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Sample rate of the backend's speech output.
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Default MP3 bitrate for the exported narration.
pub const DEFAULT_BITRATE: &str = "128k";

/// Turns synthesized audio files into PCM and PCM back into a file.
pub trait AudioCodec {
    /// Decode an audio file into a PCM buffer.
    fn decode(&self, path: &Path) -> Result<AudioBuffer>;

    /// Encode combined PCM audio into `output_path`.
    fn encode(&self, audio: &CombinedAudio, output_path: &Path) -> Result<()>;
}

/// Codec backed by an `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    /// Path to ffmpeg, or the bare name to look up on PATH
    program: PathBuf,
    sample_rate: u32,
    channels: u16,
    bitrate: String,
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            bitrate: DEFAULT_BITRATE.to_string(),
        }
    }
}

impl FfmpegCodec {
    /// Create a codec, preferring an explicitly configured ffmpeg.
    pub fn new(program: Option<PathBuf>, bitrate: &str) -> Self {
        Self {
            program: program.unwrap_or_else(|| PathBuf::from("ffmpeg")),
            bitrate: bitrate.to_string(),
            ..Self::default()
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-hide_banner", "-v", "error"]);
        cmd
    }

    /// Check if FFmpeg is available.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn pcm_args(&self) -> [String; 8] {
        [
            "-f".to_string(),
            "s16le".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ac".to_string(),
            self.channels.to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
        ]
    }
}

impl AudioCodec for FfmpegCodec {
    fn decode(&self, path: &Path) -> Result<AudioBuffer> {
        let output = self
            .command()
            .args(["-nostdin", "-i"])
            .arg(path)
            .args(self.pcm_args())
            .arg("pipe:1")
            .output()
            .context("Failed to run ffmpeg decode")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg decode failed: {}", stderr.trim());
        }

        if output.stdout.is_empty() {
            anyhow::bail!("ffmpeg decoded no audio from {}", path.display());
        }

        AudioBuffer::from_le_bytes(&output.stdout, self.sample_rate, self.channels)
    }

    fn encode(&self, audio: &CombinedAudio, output_path: &Path) -> Result<()> {
        if audio.is_empty() {
            anyhow::bail!("No audio to encode");
        }

        let sample_rate = audio.sample_rate().unwrap_or(self.sample_rate);
        let channels = audio.channels().unwrap_or(self.channels);

        let mut child = self
            .command()
            .args(["-y", "-f", "s16le", "-ar"])
            .arg(sample_rate.to_string())
            .arg("-ac")
            .arg(channels.to_string())
            .args(["-i", "pipe:0", "-c:a", "libmp3lame", "-b:a"])
            .arg(&self.bitrate)
            .args(["-f", "mp3"])
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to run ffmpeg encode")?;

        // A write error usually means ffmpeg already exited, its stderr says why
        let streamed = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&audio.to_le_bytes()),
            None => Err(std::io::Error::other("ffmpeg stdin was not captured")),
        };

        let output = child
            .wait_with_output()
            .context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg encode failed: {}", stderr.trim());
        }

        streamed.context("Failed to stream PCM to ffmpeg")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_program_fails_cleanly() {
        let codec = FfmpegCodec::new(Some(PathBuf::from("/nonexistent/ffmpeg")), "64k");
        assert!(!codec.is_available());

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp3");
        std::fs::write(&input, b"ID3").unwrap();
        let err = codec.decode(&input).unwrap_err();
        assert!(err.to_string().contains("ffmpeg decode"));
    }

    #[test]
    fn test_encode_empty_audio_is_error() {
        let dir = TempDir::new().unwrap();
        let err = FfmpegCodec::default()
            .encode(&CombinedAudio::new(), &dir.path().join("out.mp3"))
            .unwrap_err();
        assert!(err.to_string().contains("No audio"));
    }

    /// An ffmpeg stand-in that rejects the encoder without reading stdin.
    #[cfg(unix)]
    fn failing_ffmpeg(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'Unknown encoder libmp3lame' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_encode_reports_ffmpeg_stderr_when_it_exits_early() {
        let dir = TempDir::new().unwrap();
        let codec = FfmpegCodec::new(Some(failing_ffmpeg(dir.path())), "128k");

        // Ten seconds of PCM, far more than a pipe buffer holds
        let mut combined = CombinedAudio::new();
        combined
            .append(AudioBuffer::new(
                DEFAULT_SAMPLE_RATE,
                1,
                vec![0; DEFAULT_SAMPLE_RATE as usize * 10],
            ))
            .unwrap();

        let err = codec
            .encode(&combined, &dir.path().join("out.mp3"))
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("ffmpeg encode failed"), "{}", message);
        assert!(message.contains("Unknown encoder libmp3lame"), "{}", message);
    }

    #[test]
    fn test_round_trip_through_ffmpeg() {
        let codec = FfmpegCodec::default();
        if !codec.is_available() {
            return;
        }

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tone.mp3");

        // Half a second of a square wave
        let samples: Vec<i16> = (0..12000)
            .map(|i| if (i / 50) % 2 == 0 { 8000 } else { -8000 })
            .collect();
        let mut combined = CombinedAudio::new();
        combined
            .append(AudioBuffer::new(DEFAULT_SAMPLE_RATE, 1, samples))
            .unwrap();

        // Builds without libmp3lame can't run this
        let Ok(()) = codec.encode(&combined, &output) else {
            return;
        };
        let decoded = codec.decode(&output).unwrap();
        assert_eq!(decoded.sample_rate, DEFAULT_SAMPLE_RATE);
        // MP3 framing pads the edges
        assert!(decoded.duration_ms() >= 450);
    }
}
