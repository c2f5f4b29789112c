//! Configuration for LLM gateway calls
//!
//! One configuration applies to every call of a session; per-field overrides
//! do not exist.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI-compatible API base
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Model prefix that marks reasoning-capable variants
pub const REASONING_MODEL_PREFIX: &str = "gpt-5";

/// Settings used only for reasoning-capable models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// `low`, `medium` or `high`
    #[serde(default = "default_effort")]
    pub effort: String,

    /// `low`, `medium` or `high`
    #[serde(default = "default_verbosity")]
    pub verbosity: String,
}

fn default_effort() -> String {
    "medium".to_string()
}

fn default_verbosity() -> String {
    "low".to_string()
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            effort: default_effort(),
            verbosity: default_verbosity(),
        }
    }
}

/// Configuration for the LLM gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// API key; omitted when a proxy injects it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (e.g. "http://localhost:3001/v1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Reasoning-model settings
    #[serde(default)]
    pub reasoning: ReasoningConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
            base_url: None,
            timeout_ms: default_timeout_ms(),
            reasoning: ReasoningConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Whether the model is a reasoning-capable variant
    pub fn is_reasoning_model(&self) -> bool {
        self.model.starts_with(REASONING_MODEL_PREFIX)
    }

    /// Get the per-call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full chat-completions URL
    pub fn endpoint(&self) -> String {
        let base = self
            .base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} out of range [0.0, 2.0]", self.temperature));
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Apply overrides from a variable lookup
    ///
    /// | Variable | Overrides |
    /// |----------|-----------|
    /// | `OPENAI_API_KEY` | `api_key` |
    /// | `OPENAI_BASE_URL` | `base_url` |
    /// | `METACANVAS_MODEL` | `model` |
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = Some(url);
        }
        if let Some(model) = lookup("METACANVAS_MODEL").filter(|v| !v.is_empty()) {
            self.model = model;
        }
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok());
        self
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
