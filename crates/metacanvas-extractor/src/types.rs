//! Task and result types for extraction

use crate::config::ExtractorConfig;
use metacanvas_domain::FieldDefinition;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One pending extraction: a field, the source text, and a queue priority
///
/// Higher priority dequeues first. A task is consumed exactly once.
#[derive(Debug, Clone)]
pub struct ExtractionTask {
    /// Field to extract
    pub field: Arc<FieldDefinition>,

    /// Free text describing the resource
    pub source_text: Arc<str>,

    /// Queue priority
    pub priority: u8,
}

impl ExtractionTask {
    /// Create a task with an explicit priority
    pub fn new(field: Arc<FieldDefinition>, source_text: Arc<str>, priority: u8) -> Self {
        Self {
            field,
            source_text,
            priority,
        }
    }

    /// Create a task whose priority follows the field's required flag
    pub fn for_field(
        field: Arc<FieldDefinition>,
        source_text: Arc<str>,
        config: &ExtractorConfig,
    ) -> Self {
        let priority = config.priority_for(field.required);
        Self::new(field, source_text, priority)
    }

    /// Identifier of the task's field
    pub fn field_id(&self) -> &str {
        &self.field.id
    }
}

/// Outcome of one worker invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Field the result belongs to
    pub field_id: String,

    /// Normalized value, `None` when nothing was found
    pub value: Option<Value>,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Short message when the LLM call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// A successful extraction
    pub fn found(field_id: impl Into<String>, value: Option<Value>, confidence: f64) -> Self {
        let confidence = if value.is_some() { confidence } else { 0.0 };
        Self {
            field_id: field_id.into(),
            value,
            confidence,
            error: None,
        }
    }

    /// A failed extraction
    pub fn failed(field_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            value: None,
            confidence: 0.0,
            error: Some(error.into()),
        }
    }

    /// Whether the extraction failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Snapshot of the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Extractions currently running
    pub active_workers: usize,
    /// Tasks waiting for a worker
    pub queue_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_from_required_flag() {
        let config = ExtractorConfig::default();
        let text: Arc<str> = Arc::from("text");

        let required = Arc::new(FieldDefinition::new("title", "Titel").required());
        let optional = Arc::new(FieldDefinition::new("keywords", "Schlagworte"));

        assert_eq!(ExtractionTask::for_field(required, text.clone(), &config).priority, 10);
        assert_eq!(ExtractionTask::for_field(optional, text, &config).priority, 5);
    }

    #[test]
    fn test_found_without_value_has_zero_confidence() {
        let result = ExtractionResult::found("title", None, 0.85);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_error());

        let result = ExtractionResult::found("title", Some(json!("Workshop")), 0.85);
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_failed() {
        let result = ExtractionResult::failed("title", "Communication error");
        assert!(result.is_error());
        assert_eq!(result.value, None);
        assert_eq!(result.confidence, 0.0);
    }
}
