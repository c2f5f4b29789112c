//! Enriched output document
//!
//! Vocabulary values are written as `{label, uri}` pairs and shape parents
//! as the object rebuilt from their sub-fields. Everything else is copied.

use crate::shape::reconstruct;
use crate::state::{CanvasFieldState, CanvasState};
use metacanvas_domain::status::is_blank_element;
use metacanvas_domain::Vocabulary;
use serde_json::{json, Map, Value};
use tracing::warn;

/// Build the enriched metadata document from a state snapshot
pub fn enriched_metadata(state: &CanvasState) -> Map<String, Value> {
    state
        .metadata
        .iter()
        .map(|(field_id, value)| {
            let enriched = match state.field(field_id) {
                Some(field) => enrich_value(field, value),
                None => value.clone(),
            };
            (field_id.clone(), enriched)
        })
        .collect()
}

/// Pretty-printed enriched metadata document
pub fn metadata_json(state: &CanvasState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&enriched_metadata(state))
}

fn enrich_value(field: &CanvasFieldState, value: &Value) -> Value {
    if field.is_parent && !field.sub_fields.is_empty() {
        return reconstruct(field);
    }

    let vocabulary = match field.definition.vocabulary.as_ref() {
        Some(vocabulary) if !vocabulary.concepts.is_empty() => vocabulary,
        _ => return value.clone(),
    };

    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !is_blank_element(item))
                .map(|item| label_uri_pair(item, vocabulary))
                .collect(),
        ),
        v if is_blank_element(v) => {
            if field.definition.multiple {
                Value::Array(Vec::new())
            } else {
                Value::Null
            }
        }
        v => label_uri_pair(v, vocabulary),
    }
}

/// Map a stored value to `{label, uri}`: by URI, then label, then alternate label
fn label_uri_pair(value: &Value, vocabulary: &Vocabulary) -> Value {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match vocabulary.lookup_exact(&text) {
        Some(c) => json!({ "label": c.label, "uri": c.uri.clone().unwrap_or_default() }),
        None => {
            warn!("Value \"{}\" not found in vocabulary concepts", text);
            json!({ "label": text, "uri": "" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::apply_expansion;
    use metacanvas_domain::{Concept, FieldDefinition};
    use std::sync::Arc;

    fn vocab_field(multiple: bool) -> CanvasFieldState {
        let mut def = FieldDefinition::new("format", "Format").with_vocabulary(Vocabulary::closed(vec![
            Concept::new("Workshop").with_uri("http://w3id.org/format/workshop"),
            Concept::new("Webinar").with_alt_label("Online-Seminar"),
        ]));
        def.multiple = multiple;
        CanvasFieldState::new(Arc::new(def))
    }

    fn state_with(field: CanvasFieldState, value: Value) -> CanvasState {
        let mut metadata = Map::new();
        metadata.insert(field.id().to_string(), value);
        CanvasState {
            core_fields: vec![field],
            metadata,
            ..Default::default()
        }
    }

    #[test]
    fn test_vocabulary_pairs() {
        let state = state_with(
            vocab_field(true),
            json!(["http://w3id.org/format/workshop", "Online-Seminar", "", "Seminar"]),
        );
        let out = enriched_metadata(&state);

        assert_eq!(
            out["format"],
            json!([
                {"label": "Workshop", "uri": "http://w3id.org/format/workshop"},
                {"label": "Webinar", "uri": ""},
                {"label": "Seminar", "uri": ""}
            ])
        );
    }

    #[test]
    fn test_single_vocabulary_value() {
        let state = state_with(vocab_field(false), json!("Workshop"));
        assert_eq!(
            enriched_metadata(&state)["format"],
            json!({"label": "Workshop", "uri": "http://w3id.org/format/workshop"})
        );
    }

    #[test]
    fn test_empty_vocabulary_values() {
        let state = state_with(vocab_field(true), Value::Null);
        assert_eq!(enriched_metadata(&state)["format"], json!([]));

        let state = state_with(vocab_field(false), json!(""));
        assert_eq!(enriched_metadata(&state)["format"], Value::Null);
    }

    #[test]
    fn test_plain_and_unknown_fields_copied() {
        let title = CanvasFieldState::new(Arc::new(FieldDefinition::new("title", "Titel")));
        let mut state = state_with(title, json!("Workshop"));
        state.metadata.insert("template:key".to_string(), json!({"fixed": true}));

        let out = enriched_metadata(&state);
        assert_eq!(out["title"], json!("Workshop"));
        assert_eq!(out["template:key"], json!({"fixed": true}));
    }

    #[test]
    fn test_shape_parent_reconstructed() {
        let def = FieldDefinition::new("price", "Preis").with_shape(vec![
            FieldDefinition::new("amount", "Betrag"),
            FieldDefinition::new("currency", "Währung"),
        ]);
        let mut price = CanvasFieldState::new(Arc::new(def));
        price.set_value(Some(json!({"amount": 50, "currency": "EUR"})), 0.85);
        apply_expansion(&mut price, 0.85);
        if let Some(amount) = price.sub_field_mut("amount") {
            amount.set_value(Some(json!(45)), 1.0);
        }

        let state = state_with(price, json!({"amount": 50, "currency": "EUR"}));
        assert_eq!(
            enriched_metadata(&state)["price"],
            json!({"amount": 45, "currency": "EUR"})
        );
    }

    #[test]
    fn test_several_shaped_objects_kept() {
        let def = FieldDefinition::new("prices", "Preise")
            .multiple()
            .with_shape(vec![
                FieldDefinition::new("amount", "Betrag"),
                FieldDefinition::new("currency", "Währung"),
            ]);
        let prices = json!([
            {"amount": 10, "currency": "EUR"},
            {"amount": 5, "currency": "EUR"}
        ]);
        let mut field = CanvasFieldState::new(Arc::new(def));
        field.set_value(Some(prices.clone()), 0.85);
        apply_expansion(&mut field, 0.85);

        let state = state_with(field, prices.clone());
        assert_eq!(enriched_metadata(&state)["prices"], prices);
    }

    #[test]
    fn test_metadata_json_is_pretty() {
        let state = state_with(vocab_field(false), json!("Webinar"));
        let text = metadata_json(&state).unwrap();
        assert!(text.contains("\n  \"format\""));
    }
}
