//! Field definitions - one schema-defined metadata slot
//!
//! A `FieldDefinition` is immutable for the lifetime of a session. Runtime
//! status and values live in the canvas state, which holds definitions behind
//! an `Arc`.

use crate::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};

/// Declared datatype of a field
///
/// Unknown datatypes are preserved verbatim so prompts can still name them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Datatype {
    /// Free text
    String,
    /// List of values
    Array,
    /// A URI, usually validated against a pattern
    Uri,
    /// Structured object
    Object,
    /// Numeric value
    Number,
    /// Boolean flag
    Boolean,
    /// Calendar date
    Date,
    /// Any other datatype name found in a schema
    Custom(String),
}

impl Datatype {
    /// Get the datatype name as used in schemas and prompts
    pub fn as_str(&self) -> &str {
        match self {
            Datatype::String => "string",
            Datatype::Array => "array",
            Datatype::Uri => "uri",
            Datatype::Object => "object",
            Datatype::Number => "number",
            Datatype::Boolean => "boolean",
            Datatype::Date => "date",
            Datatype::Custom(name) => name,
        }
    }
}

impl Default for Datatype {
    fn default() -> Self {
        Datatype::String
    }
}

impl From<String> for Datatype {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "string" | "text" => Datatype::String,
            "array" => Datatype::Array,
            "uri" | "url" => Datatype::Uri,
            "object" => Datatype::Object,
            "number" | "integer" => Datatype::Number,
            "boolean" => Datatype::Boolean,
            "date" => Datatype::Date,
            _ => Datatype::Custom(value),
        }
    }
}

impl From<&str> for Datatype {
    fn from(value: &str) -> Self {
        Datatype::from(value.to_string())
    }
}

impl From<Datatype> for String {
    fn from(value: Datatype) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation constraints attached to a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Regular expression the value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Minimum string length
    #[serde(default, rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum string length
    #[serde(default, rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Immutable definition of one metadata field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field identifier, also the key in the metadata document
    pub id: String,

    /// Human-readable label
    pub label: String,

    /// Description shown to the model as context
    #[serde(default)]
    pub description: String,

    /// Group identifier within the schema
    #[serde(default = "default_group")]
    pub group: String,

    /// Resolved group label
    #[serde(default = "default_group_label")]
    pub group_label: String,

    /// Position of the group in the schema's group list
    #[serde(default = "default_group_order")]
    pub group_order: usize,

    /// Display name of the owning schema ("Core", "Event", ...)
    #[serde(default = "default_schema_name")]
    pub schema_name: String,

    /// Canonical URI of the field itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Declared datatype
    #[serde(default)]
    pub datatype: Datatype,

    /// Whether the field holds several values
    #[serde(default)]
    pub multiple: bool,

    /// Whether the field is required
    #[serde(default)]
    pub required: bool,

    /// Controlled vocabulary, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<Vocabulary>,

    /// Validation rules, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,

    /// Nested sub-field definitions for composite values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<FieldDefinition>>,

    /// Example values from the schema prompt section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Group id used when a schema field names none
pub const DEFAULT_GROUP: &str = "other";

/// Group label used when neither the field nor the schema provides one
pub const DEFAULT_GROUP_LABEL: &str = "Sonstige";

/// Group order for groups missing from the schema's group list
pub const DEFAULT_GROUP_ORDER: usize = 999;

/// Schema name of the core schema
pub const CORE_SCHEMA_NAME: &str = "Core";

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

fn default_group_label() -> String {
    DEFAULT_GROUP_LABEL.to_string()
}

fn default_group_order() -> usize {
    DEFAULT_GROUP_ORDER
}

fn default_schema_name() -> String {
    CORE_SCHEMA_NAME.to_string()
}

impl FieldDefinition {
    /// Create a plain string field with default grouping
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            group: default_group(),
            group_label: default_group_label(),
            group_order: DEFAULT_GROUP_ORDER,
            schema_name: default_schema_name(),
            uri: None,
            datatype: Datatype::String,
            multiple: false,
            required: false,
            vocabulary: None,
            validation: None,
            shape: None,
            examples: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the datatype
    pub fn with_datatype(mut self, datatype: impl Into<Datatype>) -> Self {
        self.datatype = datatype.into();
        self
    }

    /// Mark the field as multi-valued
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a vocabulary
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Attach a validation pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        let rules = self.validation.get_or_insert_with(ValidationRules::default);
        rules.pattern = Some(pattern.into());
        self
    }

    /// Attach a composite shape
    pub fn with_shape(mut self, shape: Vec<FieldDefinition>) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Place the field in a group
    pub fn in_group(
        mut self,
        group: impl Into<String>,
        label: impl Into<String>,
        order: usize,
    ) -> Self {
        self.group = group.into();
        self.group_label = label.into();
        self.group_order = order;
        self
    }

    /// Set the owning schema name
    pub fn in_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = schema_name.into();
        self
    }

    /// Whether the field expects several values
    pub fn expects_array(&self) -> bool {
        self.multiple || self.datatype == Datatype::Array
    }

    /// Whether the field declares a non-empty composite shape
    pub fn has_shape(&self) -> bool {
        self.shape.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Whether the field carries a vocabulary with at least one concept
    pub fn has_concepts(&self) -> bool {
        self.vocabulary.as_ref().is_some_and(|v| !v.concepts.is_empty())
    }

    /// Validation pattern, if declared
    pub fn pattern(&self) -> Option<&str> {
        self.validation.as_ref().and_then(|v| v.pattern.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datatype_parsing() {
        assert_eq!(Datatype::from("array"), Datatype::Array);
        assert_eq!(Datatype::from("URI"), Datatype::Uri);
        assert_eq!(Datatype::from("integer"), Datatype::Number);
        assert_eq!(
            Datatype::from("duration"),
            Datatype::Custom("duration".to_string())
        );
        assert_eq!(Datatype::from("duration").as_str(), "duration");
    }

    #[test]
    fn test_datatype_serde() {
        let dt: Datatype = serde_json::from_str("\"uri\"").unwrap();
        assert_eq!(dt, Datatype::Uri);
        assert_eq!(serde_json::to_string(&Datatype::Array).unwrap(), "\"array\"");
    }

    #[test]
    fn test_builder_defaults() {
        let field = FieldDefinition::new("title", "Titel");
        assert_eq!(field.group, "other");
        assert_eq!(field.group_label, "Sonstige");
        assert_eq!(field.group_order, 999);
        assert_eq!(field.schema_name, "Core");
        assert!(!field.expects_array());
        assert!(!field.has_shape());
    }

    #[test]
    fn test_expects_array() {
        assert!(FieldDefinition::new("k", "K").multiple().expects_array());
        assert!(FieldDefinition::new("k", "K")
            .with_datatype("array")
            .expects_array());
    }

    #[test]
    fn test_empty_shape_is_not_a_shape() {
        let field = FieldDefinition::new("price", "Preis").with_shape(Vec::new());
        assert!(!field.has_shape());
    }

    #[test]
    fn test_pattern() {
        let field = FieldDefinition::new("url", "URL")
            .with_datatype("uri")
            .with_pattern("^https?://");
        assert_eq!(field.pattern(), Some("^https?://"));
    }
}
