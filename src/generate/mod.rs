//! Text generation: gloss phrase plus prior text in, English sentence out.

#[cfg(feature = "http-generator")]
pub mod http;
pub mod prompt;

#[cfg(feature = "http-generator")]
pub use http::HttpGenerator;
pub use prompt::{build_prompt, max_tokens, tidy_output};

use crate::error::{Result, SignscribeError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One generation call: the collapsed gloss phrase and the text so far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationRequest {
    pub gloss: String,
    pub context: String,
}

impl GenerationRequest {
    pub fn new(gloss: &str, context: &str) -> Self {
        Self {
            gloss: gloss.to_string(),
            context: context.to_string(),
        }
    }
}

/// Converts a gloss phrase into natural-language text.
///
/// Implementations are network-bound and may be slow or fail; callers treat
/// both an error and an empty string as "no output".
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    fn name(&self) -> &str;
}

#[async_trait::async_trait]
impl<T: TextGenerator> TextGenerator for Arc<T> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Offline generator that returns the gloss phrase in sentence case.
///
/// Used by the CLI when no model endpoint is wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

#[async_trait::async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let lower = request.gloss.replace(['_', '/'], " ").to_lowercase();
        let mut chars = lower.trim().chars();
        Ok(match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        })
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Mock generator for testing.
///
/// Every request is recorded, including ones whose result is later
/// discarded.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    response: String,
    should_fail: bool,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            response: "mock sentence".to_string(),
            should_fail: false,
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on generate
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Sleep on the tokio clock before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail {
            Err(SignscribeError::Generation {
                message: "mock generation failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_response_and_records_request() {
        let generator = MockGenerator::new().with_response("Hello, how do you feel?");

        let request = GenerationRequest::new("HELLO HOW YOU FEEL", "");
        let text = generator.generate(&request).await.unwrap();

        assert_eq!(text, "Hello, how do you feel?");
        assert_eq!(generator.requests(), vec![request]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let generator = MockGenerator::new().with_failure();
        let result = generator.generate(&GenerationRequest::default()).await;

        match result {
            Err(SignscribeError::Generation { message }) => {
                assert_eq!(message, "mock generation failure");
            }
            other => panic!("Expected Generation error, got {:?}", other),
        }
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_delay_uses_tokio_clock() {
        let generator = MockGenerator::new().with_delay(Duration::from_secs(5));
        let start = tokio::time::Instant::now();

        generator.generate(&GenerationRequest::default()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_echo_generator() {
        let generator = EchoGenerator;
        let text = generator
            .generate(&GenerationRequest::new("HELLO HOW YOU/YOUR FEEL", ""))
            .await
            .unwrap();
        assert_eq!(text, "Hello how you your feel");

        let empty = generator.generate(&GenerationRequest::default()).await.unwrap();
        assert_eq!(empty, "");
    }

    #[tokio::test]
    async fn test_generator_trait_is_object_safe() {
        let generator: Arc<dyn TextGenerator> = Arc::new(MockGenerator::new().with_response("ok"));
        assert_eq!(generator.name(), "mock");
        assert_eq!(generator.generate(&GenerationRequest::default()).await.unwrap(), "ok");
    }
}
