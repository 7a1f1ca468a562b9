//! OpenAI-compatible speech provider
//!
//! Talks to any endpoint implementing `POST /audio/speech`:
//! - OpenAI
//! - Self-hosted servers exposing the same API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::catalog::MAX_INPUT_CHARS;
use crate::error::{Result, SpeechError};
use crate::provider::{SpeechAudio, SpeechProvider, SpeechRequest};

/// Provider for OpenAI-compatible speech APIs
pub struct OpenAiSpeechProvider {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    client: Client,
}

impl OpenAiSpeechProvider {
    /// Create a new provider
    pub fn new(base_url: &str, api_key: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SpeechError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateSpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio> {
        let chars = request.input.chars().count();
        if chars > MAX_INPUT_CHARS {
            return Err(SpeechError::InputTooLong {
                chars,
                limit: MAX_INPUT_CHARS,
            });
        }

        let body = CreateSpeechRequest {
            model: request.model.as_str(),
            voice: request.voice.as_str(),
            input: &request.input,
            response_format: "mp3",
        };

        let url = format!("{}/audio/speech", self.base_url);
        log::debug!(
            "POST {} model={} voice={} chars={}",
            url,
            request.model,
            request.voice,
            chars
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout {
                        seconds: self.timeout_secs,
                    }
                } else {
                    SpeechError::ApiError {
                        message: format!("Request failed: {}", e),
                        status_code: None,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&error_text);

            log::warn!("speech request failed with HTTP {}: {}", status, message);

            return Err(match status.as_u16() {
                429 => SpeechError::RateLimited { retry_after },
                503 => SpeechError::ServerOverloaded { message },
                code => SpeechError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                SpeechError::Timeout {
                    seconds: self.timeout_secs,
                }
            } else {
                SpeechError::ApiError {
                    message: format!("Failed to read audio: {}", e),
                    status_code: None,
                }
            }
        })?;

        if bytes.is_empty() {
            return Err(SpeechError::EmptyResponse);
        }

        log::debug!("received {} bytes of audio", bytes.len());

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
        })
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn is_available(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SpeechError::ConfigError("API key is empty".to_string()));
        }

        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            SpeechError::ConfigError(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SpeechError::ConfigError(format!(
                "Base URL '{}' must use http or https, not '{}'",
                self.base_url, scheme
            ))),
        }
    }
}

/// Pull the human-readable message out of an OpenAI error body.
fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Model, Voice};

    #[test]
    fn test_extract_error_message_json() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn test_extract_error_message_plain() {
        assert_eq!(extract_error_message(" bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_request_body_shape() {
        let body = CreateSpeechRequest {
            model: Model::Tts1Hd.as_str(),
            voice: Voice::Nova.as_str(),
            input: "Hallo",
            response_format: "mp3",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "tts-1-hd");
        assert_eq!(json["voice"], "nova");
        assert_eq!(json["input"], "Hallo");
        assert_eq!(json["response_format"], "mp3");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider =
            OpenAiSpeechProvider::new("http://localhost:8880/v1/", "key".to_string(), 5).unwrap();
        assert_eq!(provider.base_url, "http://localhost:8880/v1");
    }

    #[test]
    fn test_is_available_accepts_http_endpoints() {
        let provider =
            OpenAiSpeechProvider::new("https://api.openai.com/v1", "key".to_string(), 5).unwrap();
        assert!(provider.is_available().is_ok());
    }

    #[test]
    fn test_is_available_rejects_url_without_scheme() {
        let provider =
            OpenAiSpeechProvider::new("localhost:8880/v1", "key".to_string(), 5).unwrap();
        let err = provider.is_available().unwrap_err();
        assert!(matches!(err, SpeechError::ConfigError(_)));
        assert!(err.to_string().contains("localhost:8880/v1"));
    }

    #[test]
    fn test_is_available_rejects_blank_key() {
        let provider =
            OpenAiSpeechProvider::new("https://api.openai.com/v1", "  ".to_string(), 5).unwrap();
        assert!(provider.is_available().is_err());
    }

    #[tokio::test]
    async fn test_rejects_input_over_limit_without_request() {
        // Unroutable address: reaching the network would fail differently
        let provider =
            OpenAiSpeechProvider::new("http://127.0.0.1:9", "key".to_string(), 1).unwrap();
        let request = SpeechRequest::new("x".repeat(MAX_INPUT_CHARS + 1), Voice::Alloy, Model::Tts1);

        let err = provider.synthesize(request).await.unwrap_err();
        assert!(matches!(
            err,
            SpeechError::InputTooLong {
                chars,
                limit: MAX_INPUT_CHARS
            } if chars == MAX_INPUT_CHARS + 1
        ));
    }
}
