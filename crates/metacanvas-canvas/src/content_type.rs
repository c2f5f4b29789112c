//! Content-type detection
//!
//! One LLM call classifies the source text into a special schema. The
//! answer is a two-key object `{"schema": "<file>.json", "confidence": 0.92}`;
//! `"none"` means no special schema applies.

use crate::init::schema_display_name;
use metacanvas_domain::Concept;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Answer of the classification call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    /// Selected schema file, or `"none"`
    pub schema: String,

    /// Model-reported confidence
    #[serde(default)]
    pub confidence: f64,
}

impl Detection {
    /// Whether the detection selects a schema with enough confidence
    pub fn is_accepted(&self, threshold: f64) -> bool {
        self.schema != "none" && !self.schema.trim().is_empty() && self.confidence > threshold
    }
}

/// Options offered to the model
///
/// Concepts that name a schema file are listed with their description;
/// without such concepts the plain schema file list is used.
pub fn detection_prompt(
    text: &str,
    concepts: &[Concept],
    special_schemas: &[String],
    core_schema: &str,
) -> String {
    let with_schema: Vec<&Concept> = concepts
        .iter()
        .filter(|c| c.schema_file.as_deref().is_some_and(|f| !f.is_empty()))
        .collect();

    let options = if with_schema.is_empty() {
        special_schemas
            .iter()
            .enumerate()
            .map(|(i, file)| format!("{}. {} ({})", i + 1, schema_display_name(file, core_schema), file))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        with_schema
            .iter()
            .enumerate()
            .map(|(i, concept)| {
                let description = concept
                    .description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .map(|d| format!(" – {}", d))
                    .unwrap_or_default();
                format!(
                    "{}. {}{}\n   Schema-Datei: {}",
                    i + 1,
                    concept.label,
                    description,
                    concept.schema_file.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "Analysiere folgenden Text und bestimme die passendste Inhaltsart. \
         Nutze die Beschreibungen, um die programmatische Bedeutung zu verstehen.\n\n\
         Text: \"{text}\"\n\n\
         Verfügbare Inhaltsarten:\n{options}\n\n\
         Antworte NUR mit einem JSON-Objekt im Format:\n\
         {{\"schema\": \"<dateiname>.json\", \"confidence\": <0.0-1.0>}}\n\n\
         Beispiel: {{\"schema\": \"event.json\", \"confidence\": 0.92}}\n\
         Wenn keine passt: {{\"schema\": \"none\", \"confidence\": 0.0}}"
    )
}

static FLAT_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]+\}").unwrap());

/// Read the first flat JSON object of the answer
///
/// Returns `None` when the answer holds no parseable object.
pub fn parse_detection(response: &str) -> Option<Detection> {
    let found = FLAT_OBJECT.find(response.trim())?;
    serde_json::from_str(found.as_str()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detection() {
        let detection = parse_detection(r#"{"schema":"event.json","confidence":0.92}"#).unwrap();
        assert_eq!(detection.schema, "event.json");
        assert_eq!(detection.confidence, 0.92);
        assert!(detection.is_accepted(0.5));
    }

    #[test]
    fn test_none_and_low_confidence_rejected() {
        let none = parse_detection(r#"{"schema":"none","confidence":0.0}"#).unwrap();
        assert!(!none.is_accepted(0.5));

        let weak = parse_detection(r#"{"schema":"event.json","confidence":0.5}"#).unwrap();
        assert!(!weak.is_accepted(0.5));
    }

    #[test]
    fn test_parse_detection_with_prose() {
        let detection = parse_detection("Ergebnis:\n{\"schema\": \"course.json\", \"confidence\": 0.7}\nFertig");
        assert_eq!(detection.map(|d| d.schema), Some("course.json".to_string()));
    }

    #[test]
    fn test_parse_detection_garbage() {
        assert_eq!(parse_detection("keine Ahnung"), None);
        assert_eq!(parse_detection("{schema: event}"), None);
    }

    #[test]
    fn test_prompt_lists_concepts() {
        let concepts = vec![
            Concept::new("Veranstaltung")
                .with_description("Termine und Events")
                .with_schema_file("event.json"),
            Concept::new("Ohne Schema"),
        ];
        let prompt = detection_prompt("Workshop in Berlin", &concepts, &[], "core.json");

        assert!(prompt.contains("1. Veranstaltung – Termine und Events\n   Schema-Datei: event.json"));
        assert!(!prompt.contains("Ohne Schema"));
        assert!(prompt.contains(r#"{"schema": "none", "confidence": 0.0}"#));
    }

    #[test]
    fn test_prompt_falls_back_to_schema_list() {
        let schemas = vec!["event.json".to_string(), "learning_material.json".to_string()];
        let prompt = detection_prompt("text", &[], &schemas, "core.json");

        assert!(prompt.contains("1. Event (event.json)\n2. Learning Material (learning_material.json)"));
    }
}
