//! Configuration for the Extractor

use serde::{Deserialize, Serialize};

/// Configuration for the worker pool and task creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum number of extractions running at the same time
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Confidence assigned to a non-null extracted value
    #[serde(default = "default_found_confidence")]
    pub found_confidence: f64,

    /// Queue priority of required fields
    #[serde(default = "default_required_priority")]
    pub required_priority: u8,

    /// Queue priority of optional fields
    #[serde(default = "default_optional_priority")]
    pub optional_priority: u8,
}

fn default_max_workers() -> usize {
    10
}

fn default_found_confidence() -> f64 {
    0.85
}

fn default_required_priority() -> u8 {
    10
}

fn default_optional_priority() -> u8 {
    5
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            found_confidence: default_found_confidence(),
            required_priority: default_required_priority(),
            optional_priority: default_optional_priority(),
        }
    }
}

impl ExtractorConfig {
    /// Queue priority for a field
    pub fn priority_for(&self, required: bool) -> u8 {
        if required {
            self.required_priority
        } else {
            self.optional_priority
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 {
            return Err("max_workers must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.found_confidence) {
            return Err(format!(
                "found_confidence {} out of range [0.0, 1.0]",
                self.found_confidence
            ));
        }
        Ok(())
    }

    /// Apply `METACANVAS_MAX_WORKERS` from a variable lookup; invalid values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(max) = lookup("METACANVAS_MAX_WORKERS").and_then(|v| v.parse::<usize>().ok()) {
            self.max_workers = max.max(1);
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
