//! Speech provider implementations

pub mod mock;
mod openai;

pub use mock::MockProvider;
pub use openai::OpenAiSpeechProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

/// Environment variable consulted when the config has no API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Create the OpenAI-compatible provider from optional config
pub fn get_provider(config: Option<&ProviderConfig>) -> Result<Box<dyn SpeechProvider>> {
    let defaults = ProviderConfig::default();
    let config = config.unwrap_or(&defaults);
    let api_key = get_api_key(config, OPENAI_API_KEY_ENV, "OpenAI")?;
    Ok(Box::new(OpenAiSpeechProvider::new(
        config.base_url(),
        api_key,
        config.timeout_secs,
    )?))
}

/// Get API key from config or environment variable
fn get_api_key(config: &ProviderConfig, env_var: &str, provider_name: &str) -> Result<String> {
    // Check config first
    if let Some(key) = config.api_key.clone().filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| SpeechError::MissingApiKey {
            provider: provider_name.to_string(),
            env_var: env_var.to_string(),
        })
}
