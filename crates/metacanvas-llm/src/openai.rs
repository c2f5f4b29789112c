//! OpenAI-compatible Provider Implementation
//!
//! Talks to any endpoint that speaks the chat-completions protocol: the
//! OpenAI API itself, a local development proxy, or a serverless proxy that
//! injects the API key.
//!
//! # Features
//!
//! - Async HTTP communication via `reqwest`
//! - Configurable endpoint, model and temperature
//! - Reasoning parameters for `gpt-5*` models
//! - One fixed timeout per call
//! - Optional retries with exponential backoff
//!
//! # Examples
//!
//! ```no_run
//! use metacanvas_llm::{LlmConfig, OpenAiProvider};
//! use metacanvas_domain::traits::LlmProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAiProvider::new(LlmConfig::default().with_env_overrides())?;
//! let text = provider.generate("Say 'hello' and nothing else").await?;
//! # Ok(())
//! # }
//! ```

use crate::config::LlmConfig;
use crate::LlmError;
use async_trait::async_trait;
use metacanvas_domain::traits::LlmProvider as LlmProviderTrait;
use metacanvas_domain::ChatMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts per call (no retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Chat-completions provider
pub struct OpenAiProvider {
    endpoint: String,
    config: LlmConfig,
    client: reqwest::Client,
    max_attempts: u32,
}

/// Request body for the chat-completions API
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    verbosity: &'a str,
}

/// Response from the chat-completions API
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint(),
            config,
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Set the maximum number of attempts per call
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The model identifier in use
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatCompletionRequest<'a> {
        let reasoning = self.config.is_reasoning_model();
        ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            reasoning_effort: reasoning.then_some(self.config.reasoning.effort.as_str()),
            response_format: reasoning.then(|| ResponseFormat {
                kind: "text",
                verbosity: &self.config.reasoning.verbosity,
            }),
        }
    }

    /// Send messages to the chat-completions API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The endpoint is unreachable or times out
    /// - The model is not available
    /// - The response carries no message content
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = self.request_body(messages);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return parsed
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.message.content)
                            .ok_or_else(|| {
                                LlmError::InvalidResponse("No message content in response".to_string())
                            });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.config.model.clone()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        warn!(status = %status, "LLM gateway returned an error");
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(LlmError::Timeout(self.config.timeout_ms));
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_attempts {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                debug!("Retrying LLM call in {:?} (attempt {})", delay, attempts + 1);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, Self::Error> {
        self.complete(&messages).await
    }
}
