//! Metacanvas LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `metacanvas-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: Chat-completions over HTTP (OpenAI or a compatible proxy)
//!
//! # Examples
//!
//! ```
//! use metacanvas_llm::MockProvider;
//! use metacanvas_domain::traits::LlmProvider;
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod openai;

use async_trait::async_trait;
use metacanvas_domain::traits::LlmProvider as LlmProviderTrait;
use metacanvas_domain::ChatMessage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use config::{LlmConfig, ReasoningConfig};
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Call exceeded the configured timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid provider configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen by the first registered pattern that occurs in the last
/// message of a request; unmatched requests get the default response. The
/// provider never touches the network.
///
/// # Examples
///
/// ```
/// use metacanvas_llm::MockProvider;
/// use metacanvas_domain::traits::LlmProvider;
///
/// # tokio_test::block_on(async {
/// let provider = MockProvider::new("Fixed response")
///     .with_response("title", r#"{"title": "Workshop"}"#);
///
/// assert_eq!(provider.generate("extract the title").await.unwrap(), r#"{"title": "Workshop"}"#);
/// assert_eq!(provider.generate("anything else").await.unwrap(), "Fixed response");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    replies: Arc<Mutex<Vec<(String, MockReply)>>>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            replies: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reply with `response` whenever the prompt contains `pattern`
    pub fn add_response(&self, pattern: impl Into<String>, response: impl Into<String>) {
        lock(&self.replies).push((pattern.into(), MockReply::Text(response.into())));
    }

    /// Builder form of [`add_response`](Self::add_response)
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.add_response(pattern, response);
        self
    }

    /// Fail whenever the prompt contains `pattern`
    pub fn add_error(&self, pattern: impl Into<String>) {
        lock(&self.replies).push((pattern.into(), MockReply::Error("Mock error".to_string())));
    }

    /// Builder form of [`add_error`](Self::add_error)
    pub fn with_error(self, pattern: impl Into<String>) -> Self {
        self.add_error(pattern);
        self
    }

    /// Sleep for `delay` inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times the provider was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Prompts received, in call order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Highest number of calls observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Reset the call log and concurrency counters
    pub fn reset(&self) {
        lock(&self.calls).clear();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    fn reply_for(&self, prompt: &str) -> MockReply {
        lock(&self.replies)
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, Self::Error> {
        let prompt = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        lock(&self.calls).push(prompt.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.reply_for(&prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(message) => Err(LlmError::Other(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt").await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let provider = MockProvider::default()
            .with_response("hello", "world")
            .with_response("foo", "bar");

        assert_eq!(provider.generate("say hello").await.unwrap(), "world");
        assert_eq!(provider.generate("foo!").await.unwrap(), "bar");
        assert_eq!(
            provider.generate("unknown").await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_first_pattern_wins() {
        let provider = MockProvider::default()
            .with_response("Feld: price", "first")
            .with_response("price", "second");

        assert_eq!(provider.generate("Feld: price (Preis)").await.unwrap(), "first");
        assert_eq!(provider.generate("the price").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_mock_provider_call_log() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").await.unwrap();
        provider
            .chat(vec![ChatMessage::system("sys"), ChatMessage::user("prompt2")])
            .await
            .unwrap();

        assert_eq!(provider.calls(), vec!["prompt1", "prompt2"]);

        provider.reset();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default().with_error("bad prompt");

        let result = provider.generate("a bad prompt").await;
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[tokio::test]
    async fn test_in_flight_tracking() {
        let provider = MockProvider::new("ok").with_delay(Duration::from_millis(20));

        let (a, b) = tokio::join!(provider.generate("a"), provider.generate("b"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(provider.max_in_flight(), 2);
        assert_eq!(provider.in_flight.load(Ordering::SeqCst), 0);
    }
}
