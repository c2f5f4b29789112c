//! Normalization of manually entered values
//!
//! Manual edits bypass the LLM but not the field's constraints: strings are
//! trimmed, vocabulary values are canonicalized, URIs are checked against
//! the validation pattern and blank array entries are dropped.

use metacanvas_domain::status::is_blank_element;
use metacanvas_domain::{Datatype, FieldDefinition};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Normalize a value for a field; `None` means the field ends up empty
///
/// Values outside a closed or SKOS vocabulary are rejected. Open vocabularies
/// keep unmatched values.
pub fn normalize_value(field: &FieldDefinition, value: &Value) -> Option<Value> {
    if field.expects_array() {
        let items: Vec<Value> = match value {
            Value::Null => return None,
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };

        let kept: Vec<Value> = items
            .iter()
            .filter(|item| !is_blank_element(item))
            .filter_map(|item| normalize_scalar(field, item))
            .collect();

        if kept.len() < items.len() {
            warn!(
                "Removed {} invalid entries from {}",
                items.len() - kept.len(),
                field.id
            );
        }
        return (!kept.is_empty()).then_some(Value::Array(kept));
    }

    match value {
        Value::Array(items) => items.iter().find_map(|item| normalize_scalar(field, item)),
        other => normalize_scalar(field, other),
    }
}

fn normalize_scalar(field: &FieldDefinition, value: &Value) -> Option<Value> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(_) | Value::Bool(_) => return Some(value.clone()),
        other => return Some(other.clone()),
    };

    if text.is_empty() {
        return None;
    }

    if field.datatype == Datatype::Number {
        if let Some(number) = parse_number(&text) {
            return Some(number);
        }
    }

    if let Some(vocabulary) = field.vocabulary.as_ref() {
        if let Some(concept) = vocabulary.resolve(&text) {
            return Some(Value::String(concept.canonical_value().to_string()));
        }
        if vocabulary.is_controlled() {
            warn!(
                "Invalid value rejected for {} vocabulary of {}: \"{}\"",
                vocabulary.vocab_type.as_str(),
                field.id,
                text
            );
            return None;
        }
    }

    if field.datatype == Datatype::Uri {
        if let Some(pattern) = field.pattern() {
            match Regex::new(pattern) {
                Ok(regex) if !regex.is_match(&text) => {
                    warn!("Rejected value for {}: does not match {}", field.id, pattern);
                    return None;
                }
                Ok(_) => {}
                Err(e) => warn!("Invalid validation pattern on {}: {}", field.id, e),
            }
        }
    }

    Some(Value::String(text))
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
