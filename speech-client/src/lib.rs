//! Speech synthesis client library for the narrate workspace
//!
//! Provides a unified interface over text-to-speech backends:
//! - OpenAI-compatible `/audio/speech` endpoints
//! - A mock provider for tests

pub mod catalog;
pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use catalog::{MAX_INPUT_CHARS, Model, Voice};
pub use config::ProviderConfig;
pub use error::{Result, SpeechError};
pub use provider::{SpeechAudio, SpeechProvider, SpeechRequest};
pub use providers::{MockProvider, OpenAiSpeechProvider, get_provider};
