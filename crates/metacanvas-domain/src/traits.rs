//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::message::ChatMessage;
use crate::schema::{SchemaError, SchemaField, SchemaGroup};
use crate::vocabulary::Concept;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Trait for LLM gateway operations
///
/// Implemented by the infrastructure layer (metacanvas-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::fmt::Display + Send;

    /// Send an ordered list of chat messages, returning the assistant's text
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, Self::Error>;

    /// Send a single user prompt
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.chat(vec![ChatMessage::user(prompt)]).await
    }
}

/// Trait for the schema model consumed by the canvas
///
/// Implemented by the application layer (metacanvas-canvas)
pub trait SchemaSource: Send + Sync {
    /// Field entries of a schema file
    fn fields(&self, schema_file: &str) -> Result<Vec<SchemaField>, SchemaError>;

    /// Group list of a schema file
    fn groups(&self, schema_file: &str) -> Result<Vec<SchemaGroup>, SchemaError>;

    /// Partial metadata skeleton of a schema file
    fn output_template(&self, schema_file: &str) -> Result<Map<String, Value>, SchemaError>;

    /// Content-type concepts, each naming the special schema it selects
    fn content_type_concepts(&self) -> Vec<Concept>;

    /// Special schema files, used when no concept names a schema file
    fn available_special_schemas(&self) -> Vec<String> {
        Vec::new()
    }
}
