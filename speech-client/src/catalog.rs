//! Fixed catalog of voices and models offered by the speech backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SpeechError;

/// Maximum number of characters accepted in a single synthesis request.
pub const MAX_INPUT_CHARS: usize = 4096;

/// Voice used to read the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Onyx,
        Voice::Nova,
        Voice::Shimmer,
    ];

    /// Identifier sent to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }

    /// Short description of how the voice sounds.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Alloy => "neutral",
            Self::Echo => "male",
            Self::Fable => "youthful",
            Self::Onyx => "male",
            Self::Nova => "female",
            Self::Shimmer => "female",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voice::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SpeechError::UnknownIdentifier {
                kind: "voice",
                value: s.to_string(),
            })
    }
}

/// Synthesis model, each billed at its own rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
}

impl Model {
    pub const ALL: [Model; 2] = [Model::Tts1, Model::Tts1Hd];

    /// Identifier sent to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
        }
    }

    /// Price in dollars per one million input characters.
    pub fn rate_per_million(&self) -> f64 {
        match self {
            Self::Tts1 => 15.00,
            Self::Tts1Hd => 30.00,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Tts1 => "speech generation",
            Self::Tts1Hd => "HD speech generation",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tts-1" | "tts1" => Ok(Self::Tts1),
            "tts-1-hd" | "tts1hd" | "hd" => Ok(Self::Tts1Hd),
            _ => Err(SpeechError::UnknownIdentifier {
                kind: "model",
                value: s.to_string(),
            }),
        }
    }
}
