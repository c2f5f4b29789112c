//! Raw schema records as published by the schema model
//!
//! These mirror the on-disk schema layout (`system` and `prompt` sections).
//! The canvas turns them into [`FieldDefinition`](crate::FieldDefinition)s.

use crate::vocabulary::Concept;
use crate::field::ValidationRules;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by a schema source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Schema file does not exist
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// Schema file could not be read
    #[error("Schema I/O error: {0}")]
    Io(String),

    /// Schema file is not valid
    #[error("Schema parse error: {0}")]
    Parse(String),
}

/// A field group declared by a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGroup {
    /// Group identifier
    pub id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
}

/// A raw field entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field identifier
    pub id: String,

    /// Fallback label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Fallback datatype name
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Fallback required flag
    #[serde(default)]
    pub required: bool,

    /// Group identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Group label override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,

    /// Machine-facing attributes
    #[serde(default)]
    pub system: SystemSection,

    /// Prompt-facing attributes
    #[serde(default)]
    pub prompt: PromptSection,
}

/// The `system` section of a raw field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSection {
    /// Canonical field URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Whether the model may fill the field (absent means yes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_fillable: Option<bool>,

    /// Whether the field is shown to the user (absent means yes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_user: Option<bool>,

    /// Required flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Datatype name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,

    /// Multi-valued flag
    #[serde(default)]
    pub multiple: bool,

    /// Vocabulary with a free-form type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<RawVocabulary>,

    /// Validation rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,

    /// Item description for composite fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsSection>,
}

/// Vocabulary as written in a schema, before its type is normalized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVocabulary {
    /// Type name (`closed`, `skos`, `open`, or anything else)
    #[serde(default, rename = "type")]
    pub vocab_type: String,

    /// Concepts
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

/// The `items` section of a composite field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsSection {
    /// Nested field layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeSpec>,
}

/// A composite shape, written either as a list or as a map keyed by sub-field id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeSpec {
    /// `[{"id": "amount", "datatype": "number"}, ...]`
    List(Vec<ShapeEntry>),
    /// `{"amount": {"datatype": "number"}, ...}`
    Map(Map<String, Value>),
}

/// One sub-field of a shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeEntry {
    /// Sub-field identifier (filled from the key in map form)
    #[serde(default)]
    pub id: String,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Datatype name
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,

    /// Required flag
    #[serde(default)]
    pub required: bool,

    /// Multi-valued flag
    #[serde(default)]
    pub multiple: bool,

    /// Nested shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Box<ShapeSpec>>,
}

impl ShapeSpec {
    /// Entries in declaration order; map entries that are not objects are skipped
    pub fn entries(&self) -> Vec<ShapeEntry> {
        match self {
            ShapeSpec::List(entries) => entries.clone(),
            ShapeSpec::Map(map) => map
                .iter()
                .filter_map(|(id, spec)| {
                    let mut entry: ShapeEntry = serde_json::from_value(spec.clone()).ok()?;
                    entry.id = id.clone();
                    Some(entry)
                })
                .collect(),
        }
    }
}

/// The `prompt` section of a raw field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSection {
    /// Label shown to users and the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Example values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// A complete schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Group list; index is the group order
    #[serde(default)]
    pub groups: Vec<SchemaGroup>,

    /// Field entries
    #[serde(default)]
    pub fields: Vec<SchemaField>,

    /// Partial metadata skeleton
    #[serde(default)]
    pub output_template: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_field() {
        let json = r#"{
            "id": "schema:price",
            "group": "costs",
            "system": {
                "datatype": "object",
                "required": true,
                "items": {"shape": [{"id": "amount", "type": "number"}, {"id": "currency"}]}
            },
            "prompt": {"label": "Preis", "description": "Kosten der Teilnahme"}
        }"#;
        let field: SchemaField = serde_json::from_str(json).unwrap();
        assert_eq!(field.system.datatype.as_deref(), Some("object"));
        assert_eq!(field.system.required, Some(true));
        let shape = field.system.items.unwrap().shape.unwrap().entries();
        assert_eq!(shape.len(), 2);
        assert_eq!(shape[0].datatype.as_deref(), Some("number"));
    }

    #[test]
    fn test_map_shape_keeps_order() {
        let json = r#"{"currency": {"type": "string"}, "amount": {"type": "number"}, "bad": 3}"#;
        let spec: ShapeSpec = serde_json::from_str(json).unwrap();
        let entries = spec.entries();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["currency", "amount"]);
    }

    #[test]
    fn test_document_defaults() {
        let doc: SchemaDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.groups.is_empty());
        assert!(doc.fields.is_empty());
        assert!(doc.output_template.is_empty());
    }
}
