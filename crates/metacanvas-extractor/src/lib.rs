//! Metacanvas Extractor
//!
//! Fills single metadata fields from free text with one LLM call per field.
//!
//! # Overview
//!
//! Each field becomes an [`ExtractionTask`] with a priority (required fields
//! first). The [`WorkerPool`] runs tasks against an LLM provider under a
//! worker cap, renders the prompt with [`PromptBuilder`], and turns the
//! model's answer into a typed value with the two-tier [`parser`].
//!
//! # Architecture
//!
//! ```text
//! Field + Text → Task Queue → Worker → LLM → Parser → ExtractionResult
//! ```
//!
//! # Example Usage
//!
//! ```
//! use metacanvas_domain::FieldDefinition;
//! use metacanvas_extractor::{ExtractionTask, ExtractorConfig, WorkerPool};
//! use metacanvas_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let llm = MockProvider::new(r#"{"title": "Rust Workshop"}"#);
//! let config = ExtractorConfig::default();
//! let pool = WorkerPool::new(Arc::new(llm), &config);
//!
//! let field = Arc::new(FieldDefinition::new("title", "Titel").required());
//! let task = ExtractionTask::for_field(field, Arc::from("Rust Workshop in Berlin"), &config);
//!
//! let result = pool.submit(task).await.unwrap();
//! assert_eq!(result.value, Some(serde_json::json!("Rust Workshop")));
//! # });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod parser;
pub mod pool;
pub mod prompt;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use parser::{parse_response, RawValue};
pub use pool::WorkerPool;
pub use prompt::PromptBuilder;
pub use types::{ExtractionResult, ExtractionTask, PoolStatus};
