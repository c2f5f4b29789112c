//! Configuration for the Canvas

use serde::{Deserialize, Serialize};

/// Canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Schema file holding the core fields
    #[serde(default = "default_core_schema")]
    pub core_schema: String,

    /// Core field that records the content type
    #[serde(default = "default_content_type_field")]
    pub content_type_field: String,

    /// Detections at or below this confidence are ignored
    #[serde(default = "default_detection_threshold")]
    pub detection_threshold: f64,
}

fn default_core_schema() -> String {
    "core.json".to_string()
}

fn default_content_type_field() -> String {
    "ccm:oeh_flex_lrt".to_string()
}

fn default_detection_threshold() -> f64 {
    0.5
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            core_schema: default_core_schema(),
            content_type_field: default_content_type_field(),
            detection_threshold: default_detection_threshold(),
        }
    }
}

impl CanvasConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.core_schema.trim().is_empty() {
            return Err("core_schema must not be empty".to_string());
        }
        if self.content_type_field.trim().is_empty() {
            return Err("content_type_field must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(format!(
                "detection_threshold {} out of range [0.0, 1.0]",
                self.detection_threshold
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CanvasConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.core_schema, "core.json");
        assert_eq!(config.content_type_field, "ccm:oeh_flex_lrt");
        assert_eq!(config.detection_threshold, 0.5);
    }

    #[test]
    fn test_invalid_threshold() {
        let config = CanvasConfig {
            detection_threshold: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = CanvasConfig::from_toml(r#"core_schema = "basis.json""#).unwrap();
        assert_eq!(config.core_schema, "basis.json");
        assert_eq!(config.content_type_field, "ccm:oeh_flex_lrt");
    }
}
