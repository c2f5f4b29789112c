//! Prompt rendering for single-field extraction
//!
//! Prompts are written in German, matching the language of the schemas and
//! vocabularies they describe.

use metacanvas_domain::FieldDefinition;

/// Builds the extraction prompt for one field
pub struct PromptBuilder<'a> {
    field: &'a FieldDefinition,
    text: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(field: &'a FieldDefinition, text: &'a str) -> Self {
        Self { field, text }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let field = self.field;
        let mut prompt = String::from("Extrahiere folgendes Metadatenfeld aus dem Text:\n\n");

        prompt.push_str(&format!("Text: \"{}\"\n\n", self.text));
        prompt.push_str(&format!("Feld: {} ({})\n", field.id, field.label));

        if !field.description.is_empty() {
            prompt.push_str(&format!("Beschreibung: {}\n", field.description));
        }

        prompt.push_str(&format!("Typ: {}\n", field.datatype));

        if field.multiple {
            prompt.push_str("Hinweis: Mehrere Werte möglich (Array)\n");
        }

        if let Some(shape) = field.shape.as_ref().filter(|s| !s.is_empty()) {
            prompt.push_str("\nStruktur des Werts (JSON-Objekt mit diesen Schlüsseln):\n");
            for sub in shape {
                prompt.push_str(&format!("- {} ({}, {})\n", sub.id, sub.label, sub.datatype));
            }
        }

        if !field.examples.is_empty() {
            prompt.push_str(&format!("Beispiele: {}\n", field.examples.join(", ")));
        }

        let concepts = field
            .vocabulary
            .as_ref()
            .map(|v| v.concepts.as_slice())
            .unwrap_or_default();

        if !concepts.is_empty() {
            prompt.push_str("\nErlaubte Werte:\n");
            for concept in concepts {
                prompt.push_str(&format!("- {}", concept.label));
                if !concept.alt_labels.is_empty() {
                    prompt.push_str(&format!(" (auch: {})", concept.alt_labels.join(", ")));
                }
                prompt.push('\n');
            }
        }

        prompt.push_str(&format!(
            "\nAntworte NUR mit einem JSON-Objekt im Format: {{\"{}\": <wert>}}\n",
            field.id
        ));
        prompt.push_str("Verwende null wenn der Wert nicht extrahierbar ist.\n");

        if field.expects_array() {
            prompt.push_str(&format!(
                "Für mehrere Werte verwende ein Array: {{\"{}\": [\"Wert1\", \"Wert2\"]}}\n",
                field.id
            ));
        }

        if !concepts.is_empty() {
            prompt.push_str("WICHTIG: Verwende NUR die exakten Labels aus der Liste oben!\n");
        }

        prompt
    }
}
