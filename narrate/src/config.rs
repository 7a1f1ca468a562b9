//! narrate configuration management.

use crate::audio::codec::DEFAULT_BITRATE;
use crate::text::{DEFAULT_MAX_CHARS, OversizedTokenPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use speech_client::{Model, ProviderConfig, Voice};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrateConfig {
    /// Default voice
    #[serde(default)]
    pub voice: Voice,

    /// Default model (determines the price per character)
    #[serde(default)]
    pub model: Model,

    /// Maximum characters sent per synthesis request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// What to do with a word longer than `max_chunk_chars`
    #[serde(default)]
    pub oversized_tokens: OversizedTokenPolicy,

    /// Path to ffmpeg. None means look it up on PATH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<PathBuf>,

    /// MP3 bitrate of the exported narration
    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// OpenAI-compatible endpoint settings
    #[serde(default)]
    pub openai: ProviderConfig,
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_bitrate() -> String {
    DEFAULT_BITRATE.to_string()
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            voice: Voice::default(),
            model: Model::default(),
            max_chunk_chars: default_max_chunk_chars(),
            oversized_tokens: OversizedTokenPolicy::default(),
            ffmpeg: None,
            bitrate: default_bitrate(),
            openai: ProviderConfig::default(),
        }
    }
}

impl NarrateConfig {
    /// Get the config file path: ~/.config/cli-programs/narrate.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("cli-programs").join("narrate.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: NarrateConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}
