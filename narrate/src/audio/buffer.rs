//! In-memory PCM audio.

use anyhow::Result;

/// Decoded audio of one synthesized chunk (interleaved signed 16-bit PCM).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Parse raw little-endian `s16le` bytes as produced by ffmpeg.
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            anyhow::bail!("PCM data has odd length {}", bytes.len());
        }

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self::new(sample_rate, channels, samples))
    }

    /// Playback length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        duration_ms(self.samples.len(), self.sample_rate, self.channels)
    }
}

/// Running concatenation of all chunk buffers of one request.
#[derive(Debug, Default)]
pub struct CombinedAudio {
    /// (sample_rate, channels) fixed by the first appended buffer
    format: Option<(u32, u16)>,
    samples: Vec<i16>,
    segments: usize,
}

impl CombinedAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buffer at the end, consuming it.
    ///
    /// Fails if its format differs from the buffers already appended.
    pub fn append(&mut self, buffer: AudioBuffer) -> Result<()> {
        let format = (buffer.sample_rate, buffer.channels);
        match self.format {
            None => self.format = Some(format),
            Some(expected) if expected != format => {
                anyhow::bail!(
                    "audio format {} Hz/{} ch does not match {} Hz/{} ch of earlier chunks",
                    format.0,
                    format.1,
                    expected.0,
                    expected.1
                );
            }
            Some(_) => {}
        }

        self.samples.extend_from_slice(&buffer.samples);
        self.segments += 1;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.segments == 0
    }

    /// Number of buffers appended so far.
    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.format.map(|(rate, _)| rate)
    }

    pub fn channels(&self) -> Option<u16> {
        self.format.map(|(_, channels)| channels)
    }

    /// Samples as little-endian `s16le` bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    pub fn duration_ms(&self) -> u64 {
        match self.format {
            Some((rate, channels)) => duration_ms(self.samples.len(), rate, channels),
            None => 0,
        }
    }
}

fn duration_ms(samples: usize, sample_rate: u32, channels: u16) -> u64 {
    let frames_per_sec = sample_rate as u64 * channels.max(1) as u64;
    if frames_per_sec == 0 {
        return 0;
    }
    samples as u64 * 1000 / frames_per_sec
}
