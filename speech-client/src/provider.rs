use async_trait::async_trait;

use crate::catalog::{Model, Voice};
use crate::error::Result;

/// Request to send to a speech provider
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub input: String,
    pub voice: Voice,
    pub model: Model,
}

impl SpeechRequest {
    pub fn new(input: impl Into<String>, voice: Voice, model: Model) -> Self {
        Self {
            input: input.into(),
            voice,
            model,
        }
    }
}

/// Encoded audio returned by a speech provider (MP3)
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
}

/// Trait for speech providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize the request input into audio
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is usable (API key set, endpoint well formed, etc.)
    fn is_available(&self) -> Result<()>;
}
