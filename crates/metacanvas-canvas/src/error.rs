//! Error types for the Canvas

use metacanvas_domain::SchemaError;
use thiserror::Error;

/// Errors that abort a canvas operation
///
/// Field-level extraction failures never surface here; they are recorded on
/// the field itself.
#[derive(Error, Debug)]
pub enum CanvasError {
    /// Schema could not be loaded
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// No field with this id exists in the current state
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Output serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
