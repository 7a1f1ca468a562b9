//! Mock speech provider for testing
//!
//! Echoes each request's input back as the "audio" bytes so callers can check
//! which text produced which segment, and can be told to fail on a given call.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechAudio, SpeechProvider, SpeechRequest};

/// What the mock returns on a successful call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    /// The request input, as UTF-8 bytes
    Echo,
    /// Zero bytes
    Empty,
}

/// A mock provider that records every request it receives
pub struct MockProvider {
    /// 1-based call number that fails (None = never fail)
    fail_on: Option<usize>,
    /// Error to return on the failing call
    fail_with: Mutex<Option<SpeechError>>,
    /// Current call count
    call_count: AtomicUsize,
    /// Inputs of every request, in call order
    requests: Mutex<Vec<String>>,
    payload: Payload,
}

impl MockProvider {
    fn build(fail_on: Option<usize>, error: Option<SpeechError>, payload: Payload) -> Self {
        Self {
            fail_on,
            fail_with: Mutex::new(error),
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            payload,
        }
    }

    /// Create a provider that always succeeds and echoes the input as audio
    pub fn echo() -> Self {
        Self::build(None, None, Payload::Echo)
    }

    /// Create a provider that echoes, except call `n` (1-based) fails with `error`
    pub fn fails_on_call(n: usize, error: SpeechError) -> Self {
        Self::build(Some(n), Some(error), Payload::Echo)
    }

    /// Create a provider that reports success but returns no audio bytes
    pub fn returns_empty() -> Self {
        Self::build(None, None, Payload::Empty)
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Inputs received so far, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.input.clone());

        if self.fail_on == Some(call_num) {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        let bytes = match self.payload {
            Payload::Echo => request.input.into_bytes(),
            Payload::Empty => Vec::new(),
        };

        Ok(SpeechAudio { bytes })
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a SpeechError (needed because SpeechError doesn't implement Clone)
fn clone_error(err: &SpeechError) -> SpeechError {
    match err {
        SpeechError::MissingApiKey { provider, env_var } => SpeechError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        SpeechError::InputTooLong { chars, limit } => SpeechError::InputTooLong {
            chars: *chars,
            limit: *limit,
        },
        SpeechError::RateLimited { retry_after } => SpeechError::RateLimited {
            retry_after: *retry_after,
        },
        SpeechError::ServerOverloaded { message } => SpeechError::ServerOverloaded {
            message: message.clone(),
        },
        SpeechError::Timeout { seconds } => SpeechError::Timeout { seconds: *seconds },
        SpeechError::ApiError {
            message,
            status_code,
        } => SpeechError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        SpeechError::EmptyResponse => SpeechError::EmptyResponse,
        SpeechError::UnknownIdentifier { kind, value } => SpeechError::UnknownIdentifier {
            kind: *kind,
            value: value.clone(),
        },
        SpeechError::ConfigError(s) => SpeechError::ConfigError(s.clone()),
        // Io errors can't be cloned, keep kind and message
        SpeechError::Io(e) => SpeechError::Io(std::io::Error::new(e.kind(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Model, Voice};

    fn request(input: &str) -> SpeechRequest {
        SpeechRequest::new(input, Voice::Alloy, Model::Tts1)
    }

    #[tokio::test]
    async fn test_echo() {
        let provider = MockProvider::echo();

        let audio = provider.synthesize(request("hello")).await.unwrap();
        assert_eq!(audio.bytes, b"hello");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.requests(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_fails_on_second_call_only() {
        let provider = MockProvider::fails_on_call(
            2,
            SpeechError::ServerOverloaded {
                message: "overloaded".to_string(),
            },
        );

        assert!(provider.synthesize(request("one")).await.is_ok());
        let err = provider.synthesize(request("two")).await.unwrap_err();
        assert!(err.to_string().contains("overloaded"));
        assert!(provider.synthesize(request("three")).await.is_ok());
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.requests(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_returns_empty() {
        let provider = MockProvider::returns_empty();
        let audio = provider.synthesize(request("hello")).await.unwrap();
        assert!(audio.bytes.is_empty());
    }
}
