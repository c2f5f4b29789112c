//! Configuration management for the CLI.
//!
//! One TOML file holds the settings of every layer:
//!
//! ```toml
//! schema_dir = "schemas"
//!
//! [llm]
//! model = "gpt-4.1-mini"
//!
//! [extractor]
//! max_workers = 10
//!
//! [canvas]
//! core_schema = "core.json"
//!
//! [settings]
//! color = true
//! ```

use crate::error::{CliError, Result};
use metacanvas_canvas::CanvasConfig;
use metacanvas_extractor::ExtractorConfig;
use metacanvas_llm::LlmConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the schema JSON files
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// LLM gateway settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Worker pool settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Canvas settings
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Attempts per LLM call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Edit session history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Field table
    Table,
    /// Enriched metadata document
    Json,
    /// Fill counter only
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".metacanvas").join("config.toml"))
    }

    /// Load configuration from `path`, or the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides from a variable lookup.
    ///
    /// `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `METACANVAS_MODEL` go to the
    /// LLM settings, `METACANVAS_MAX_WORKERS` to the worker pool.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.llm.apply_overrides(&lookup);
        self.extractor.apply_overrides(&lookup);
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.llm
            .validate()
            .map_err(|e| CliError::Config(format!("[llm] {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.canvas
            .validate()
            .map_err(|e| CliError::Config(format!("[canvas] {}", e)))?;
        if self.settings.max_attempts == 0 {
            return Err(CliError::Config(
                "[settings] max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            llm: LlmConfig::default(),
            extractor: ExtractorConfig::default(),
            canvas: CanvasConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Json,
            max_attempts: default_max_attempts(),
            history_size: default_history_size(),
        }
    }
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Json
}

fn default_max_attempts() -> u32 {
    1
}

fn default_history_size() -> usize {
    1000
}
