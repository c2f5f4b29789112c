//! Canvas state: per-field runtime status and the root aggregate
//!
//! Only the [`CanvasStore`](crate::store::CanvasStore) mutates a
//! `CanvasState`; everyone else sees `Arc` snapshots.

use crate::grouping::group_fields;
use metacanvas_domain::{is_value_filled, FieldDefinition, FieldStatus};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Runtime projection of one field definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasFieldState {
    /// Immutable schema definition
    pub definition: Arc<FieldDefinition>,

    /// Lifecycle status
    pub status: FieldStatus,

    /// Current value (`[]` or `null` when empty)
    pub value: Value,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Short message when the last extraction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,

    /// Whether the value was expanded into sub-fields
    pub is_parent: bool,

    /// Sub-fields in shape order, present only after expansion
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_fields: Vec<CanvasFieldState>,
}

impl CanvasFieldState {
    /// Create an empty field state
    pub fn new(definition: Arc<FieldDefinition>) -> Self {
        Self {
            value: empty_value(&definition),
            definition,
            status: FieldStatus::Empty,
            confidence: 0.0,
            extraction_error: None,
            is_parent: false,
            sub_fields: Vec::new(),
        }
    }

    /// Field identifier
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Whether the field currently counts as filled
    pub fn is_filled(&self) -> bool {
        self.status == FieldStatus::Filled
    }

    /// Mark the field as being extracted
    pub fn mark_extracting(&mut self) {
        self.status = FieldStatus::Extracting;
        self.extraction_error = None;
    }

    /// Store a value; status follows the value and confidence is kept only
    /// for filled values
    pub fn set_value(&mut self, value: Option<Value>, confidence: f64) {
        let value = value.unwrap_or_else(|| empty_value(&self.definition));
        self.status = FieldStatus::for_value(&value);
        self.confidence = if self.is_filled() { confidence } else { 0.0 };
        self.value = value;
        self.extraction_error = None;
    }

    /// Record a failed extraction
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = FieldStatus::Error;
        self.value = Value::Null;
        self.confidence = 0.0;
        self.extraction_error = Some(message.into());
    }

    /// Sub-field by shape id
    pub fn sub_field(&self, id: &str) -> Option<&CanvasFieldState> {
        self.sub_fields.iter().find(|f| f.id() == id)
    }

    /// Mutable sub-field by shape id
    pub fn sub_field_mut(&mut self, id: &str) -> Option<&mut CanvasFieldState> {
        self.sub_fields.iter_mut().find(|f| f.id() == id)
    }
}

/// Value of a field that holds nothing
pub fn empty_value(definition: &FieldDefinition) -> Value {
    if definition.multiple {
        Value::Array(Vec::new())
    } else {
        Value::Null
    }
}

/// Fields of one schema group, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGroup {
    /// Group identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Schema the group belongs to ("Core", "Event", ...)
    pub schema_name: String,
    /// Position in the schema's group list
    pub order: usize,
    /// Member field ids
    pub field_ids: Vec<String>,
}

/// Root aggregate of an extraction session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanvasState {
    /// Text the fields are extracted from
    pub source_text: String,

    /// Special schema chosen by detection
    pub detected_content_type: Option<String>,

    /// Confidence of the detection
    pub content_type_confidence: f64,

    /// Special schema currently loaded (detected or chosen by hand)
    pub selected_content_type: Option<String>,

    /// Fields from the core schema
    pub core_fields: Vec<CanvasFieldState>,

    /// Fields from the special schema
    pub special_fields: Vec<CanvasFieldState>,

    /// Derived grouping of all fields
    pub field_groups: Vec<FieldGroup>,

    /// Whether a batch is running
    pub is_extracting: bool,

    /// Share of filled fields in percent
    pub extraction_progress: f64,

    /// Number of core and special fields
    pub total_fields: usize,

    /// Number of fields with status `filled`
    pub filled_fields: usize,

    /// Running output document, field id to value
    pub metadata: Map<String, Value>,
}

impl CanvasState {
    /// Core fields followed by special fields
    pub fn all_fields(&self) -> impl Iterator<Item = &CanvasFieldState> {
        self.core_fields.iter().chain(self.special_fields.iter())
    }

    /// Top-level field by id
    pub fn field(&self, id: &str) -> Option<&CanvasFieldState> {
        self.all_fields().find(|f| f.id() == id)
    }

    /// Mutable top-level field by id
    pub fn field_mut(&mut self, id: &str) -> Option<&mut CanvasFieldState> {
        self.core_fields
            .iter_mut()
            .chain(self.special_fields.iter_mut())
            .find(|f| f.id() == id)
    }

    /// Recompute counters, progress and groups from the field lists
    pub fn recompute(&mut self) {
        self.total_fields = self.core_fields.len() + self.special_fields.len();
        self.filled_fields = self.all_fields().filter(|f| f.is_filled()).count();
        self.extraction_progress = if self.total_fields == 0 {
            0.0
        } else {
            self.filled_fields as f64 / self.total_fields as f64 * 100.0
        };
        self.field_groups = group_fields(self.all_fields());
    }

    /// Ids of fields whose status contradicts their value
    pub fn inconsistent_fields(&self) -> Vec<&str> {
        self.all_fields()
            .filter(|f| f.status != FieldStatus::Error && f.is_filled() != is_value_filled(&f.value))
            .map(|f| f.id())
            .collect()
    }
}
