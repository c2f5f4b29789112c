//! Controlled vocabularies
//!
//! A vocabulary constrains the value space of a field. `Closed` rejects values
//! outside the concept list, `Skos` does the same and additionally carries
//! canonical URIs, `Open` suggests concepts but keeps unmatched values.

use serde::{Deserialize, Serialize};

/// Kind of vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyType {
    /// Fixed list, values outside it are rejected
    #[default]
    Closed,
    /// SKOS concept scheme with URIs, values outside it are rejected
    Skos,
    /// Suggestions only
    Open,
}

impl VocabularyType {
    /// Parse a vocabulary type, treating anything unknown as closed
    pub fn parse_lenient(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "skos" => VocabularyType::Skos,
            "open" => VocabularyType::Open,
            _ => VocabularyType::Closed,
        }
    }

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            VocabularyType::Closed => "closed",
            VocabularyType::Skos => "skos",
            VocabularyType::Open => "open",
        }
    }
}

/// One concept of a vocabulary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Preferred label
    pub label: String,

    /// English label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_en: Option<String>,

    /// Canonical URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Alternate labels
    #[serde(default, rename = "altLabels", skip_serializing_if = "Vec::is_empty")]
    pub alt_labels: Vec<String>,

    /// Description, used by content-type detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Special schema selected by this concept (content-type vocabulary only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_file: Option<String>,
}

impl Concept {
    /// Create a concept with a label only
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Set the URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Add an alternate label
    pub fn with_alt_label(mut self, alt: impl Into<String>) -> Self {
        self.alt_labels.push(alt.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the special schema file
    pub fn with_schema_file(mut self, schema_file: impl Into<String>) -> Self {
        self.schema_file = Some(schema_file.into());
        self
    }

    /// The value stored for this concept: its URI when present, else its label
    pub fn canonical_value(&self) -> &str {
        match self.uri.as_deref() {
            Some(uri) if !uri.is_empty() => uri,
            _ => &self.label,
        }
    }

    /// Case-insensitive match against the label and alternate labels
    pub fn matches_label_ignore_case(&self, text: &str) -> bool {
        let needle = text.to_lowercase();
        self.label.to_lowercase() == needle
            || self.alt_labels.iter().any(|alt| alt.to_lowercase() == needle)
    }
}

/// A vocabulary attached to a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Vocabulary kind
    #[serde(rename = "type", default)]
    pub vocab_type: VocabularyType,

    /// Concepts in schema order
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

impl Vocabulary {
    /// Create a closed vocabulary
    pub fn closed(concepts: Vec<Concept>) -> Self {
        Self {
            vocab_type: VocabularyType::Closed,
            concepts,
        }
    }

    /// Create a SKOS vocabulary
    pub fn skos(concepts: Vec<Concept>) -> Self {
        Self {
            vocab_type: VocabularyType::Skos,
            concepts,
        }
    }

    /// Create an open vocabulary
    pub fn open(concepts: Vec<Concept>) -> Self {
        Self {
            vocab_type: VocabularyType::Open,
            concepts,
        }
    }

    /// Whether values outside the concept list are rejected
    pub fn is_controlled(&self) -> bool {
        matches!(self.vocab_type, VocabularyType::Closed | VocabularyType::Skos)
    }

    /// Case-insensitive lookup by label or alternate label
    pub fn match_text(&self, text: &str) -> Option<&Concept> {
        self.concepts
            .iter()
            .find(|c| c.matches_label_ignore_case(text))
    }

    /// Case-insensitive lookup by URI, label or alternate label
    pub fn resolve(&self, text: &str) -> Option<&Concept> {
        let trimmed = text.trim();
        self.concepts
            .iter()
            .find(|c| {
                c.uri
                    .as_deref()
                    .is_some_and(|uri| uri.eq_ignore_ascii_case(trimmed))
            })
            .or_else(|| self.match_text(trimmed))
    }

    /// Exact lookup in serialization order: URI, then label, then alternate label
    pub fn lookup_exact(&self, value: &str) -> Option<&Concept> {
        self.concepts
            .iter()
            .find(|c| c.uri.as_deref() == Some(value))
            .or_else(|| self.concepts.iter().find(|c| c.label == value))
            .or_else(|| {
                self.concepts
                    .iter()
                    .find(|c| c.alt_labels.iter().any(|alt| alt == value))
            })
    }

    /// Find the concept that selects the given special schema
    pub fn by_schema_file(&self, schema_file: &str) -> Option<&Concept> {
        self.concepts
            .iter()
            .find(|c| c.schema_file.as_deref() == Some(schema_file))
    }
}
