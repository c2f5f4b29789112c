//! Two-tier parsing of LLM responses into field values
//!
//! The first tier looks for a JSON object in the response and reads the
//! field's own key from it. The result is classified as a [`RawValue`] and
//! normalized by pure functions. The second tier applies plain-text rules
//! and runs only when no JSON object can be parsed. Neither tier panics on
//! malformed input; the worst case is `None`.

use crate::error::ExtractorError;
use metacanvas_domain::status::is_blank_element;
use metacanvas_domain::{Datatype, FieldDefinition};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A value read from the model's JSON answer, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Key missing or explicitly null
    Null,
    /// String, number or boolean
    Scalar(Value),
    /// JSON array
    Array(Vec<Value>),
    /// JSON object
    Object(Map<String, Value>),
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Array(items) => RawValue::Array(items),
            Value::Object(map) => RawValue::Object(map),
            scalar => RawValue::Scalar(scalar),
        }
    }
}

/// Parse a model response into a normalized field value
///
/// Returns `None` when nothing usable was found.
pub fn parse_response(response: &str, field: &FieldDefinition) -> Option<Value> {
    match parse_json_tier(response, field) {
        Ok(raw) => {
            let value = normalize_raw(raw, field);
            debug!("Parsed {}: {:?}", field.id, value);
            value
        }
        Err(e) => {
            debug!("Falling back to text parsing for {}: {}", field.id, e);
            parse_text_fallback(response, field)
        }
    }
}

/// Slice from the first `{` to the last `}`, if both exist in that order
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// First tier: locate and parse the JSON object, then read the field's key
///
/// # Errors
///
/// Returns an error if the text has no JSON object or it does not parse.
pub fn parse_json_tier(text: &str, field: &FieldDefinition) -> Result<RawValue, ExtractorError> {
    let json = extract_json_object(text).ok_or(ExtractorError::NoJsonObject)?;
    let parsed: Value = serde_json::from_str(json)?;

    Ok(match parsed {
        Value::Object(mut map) => map.remove(&field.id).map(RawValue::from).unwrap_or(RawValue::Null),
        _ => RawValue::Null,
    })
}

/// Normalize a classified value according to the field definition
pub fn normalize_raw(raw: RawValue, field: &FieldDefinition) -> Option<Value> {
    let shaped = field.has_shape();

    let value = match raw {
        RawValue::Null => return None,
        RawValue::Object(map) if shaped => {
            let object = Value::Object(map);
            return Some(if field.multiple {
                Value::Array(vec![object])
            } else {
                object
            });
        }
        RawValue::Object(map) => Value::String(flatten_object(&map)?),
        RawValue::Array(items) if items.is_empty() => return None,
        RawValue::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) if !shaped => {
                        flatten_object(&map).map(Value::String).unwrap_or(Value::Null)
                    }
                    other => other,
                })
                .collect(),
        ),
        RawValue::Scalar(scalar) => scalar,
    };

    let value = if field.multiple && !value.is_array() {
        match value {
            Value::String(s) if !s.trim().is_empty() => Value::Array(vec![Value::String(s)]),
            _ => return None,
        }
    } else {
        value
    };

    match value {
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter(|v| !is_blank_element(v)).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other),
    }
}

/// Flatten an object to a single display string
///
/// An `{amount, currency}` pair becomes `"<amount> <currency>"`; anything else
/// becomes `"key: value, key: value"`. Empty objects yield `None`.
pub fn flatten_object(map: &Map<String, Value>) -> Option<String> {
    if let (Some(amount), Some(currency)) = (map.get("amount"), map.get("currency")) {
        return Some(format!("{} {}", display_value(amount), display_value(currency)));
    }

    let joined = map
        .iter()
        .map(|(k, v)| format!("{}: {}", k, display_value(v)))
        .collect::<Vec<_>>()
        .join(", ");

    (!joined.is_empty()).then_some(joined)
}

/// Render a JSON value for display inside a flattened string
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Second tier: plain-text rules for responses without a parseable object
pub fn parse_text_fallback(response: &str, field: &FieldDefinition) -> Option<Value> {
    let text = response.trim();

    if text.is_empty() || text == "null" || text.eq_ignore_ascii_case("nicht gefunden") {
        return None;
    }

    if field.expects_array() {
        let items: Vec<Value> = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect();
        return (!items.is_empty()).then_some(Value::Array(items));
    }

    if field.datatype == Datatype::Uri {
        if let Some(pattern) = field.pattern() {
            match Regex::new(pattern) {
                Ok(regex) if !regex.is_match(text) => {
                    debug!("Rejected {} for {}: pattern mismatch", text, field.id);
                    return None;
                }
                Ok(_) => {}
                Err(e) => warn!("Invalid validation pattern on {}: {}", field.id, e),
            }
        }
    }

    if let Some(concept) = field.vocabulary.as_ref().and_then(|v| v.match_text(text)) {
        return Some(Value::String(concept.canonical_value().to_string()));
    }

    Some(Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metacanvas_domain::{is_value_filled, Concept, Vocabulary};
    use proptest::prelude::*;
    use serde_json::json;

    fn price_field() -> FieldDefinition {
        FieldDefinition::new("price", "Preis")
    }

    #[test]
    fn test_multiple_drops_blank_elements() {
        let field = FieldDefinition::new("x", "X").multiple();
        let value = parse_response(r#"{"x": ["A", "", null, "B"]}"#, &field);
        assert_eq!(value, Some(json!(["A", "B"])));
    }

    #[test]
    fn test_price_object_flattened() {
        let value = parse_response(r#"{"price": {"amount": 120, "currency": "EUR"}}"#, &price_field());
        assert_eq!(value, Some(json!("120 EUR")));
    }

    #[test]
    fn test_float_amount_without_fraction() {
        let value = parse_response(r#"{"price": {"amount": 120.0, "currency": "EUR"}}"#, &price_field());
        assert_eq!(value, Some(json!("120 EUR")));

        let value = parse_response(r#"{"price": {"amount": 12.5, "currency": "EUR"}}"#, &price_field());
        assert_eq!(value, Some(json!("12.5 EUR")));
    }

    #[test]
    fn test_generic_object_flattened() {
        let field = FieldDefinition::new("location", "Ort");
        let value = parse_response(r#"{"location": {"city": "Berlin", "zip": 10115}}"#, &field);
        assert_eq!(value, Some(json!("city: Berlin, zip: 10115")));

        let value = parse_response(r#"{"location": {}}"#, &field);
        assert_eq!(value, None);
    }

    #[test]
    fn test_array_object_elements_flattened() {
        let field = FieldDefinition::new("prices", "Preise").multiple();
        let value = parse_response(
            r#"{"prices": [{"amount": 5, "currency": "EUR"}, {"type": "ermäßigt"}, {}]}"#,
            &field,
        );
        assert_eq!(value, Some(json!(["5 EUR", "type: ermäßigt"])));
    }

    #[test]
    fn test_shaped_field_keeps_object() {
        let field = FieldDefinition::new("price", "Preis").with_shape(vec![
            FieldDefinition::new("amount", "Betrag"),
            FieldDefinition::new("currency", "Währung"),
        ]);
        let value = parse_response(r#"{"price": {"amount": 50, "currency": "EUR"}}"#, &field);
        assert_eq!(value, Some(json!({"amount": 50, "currency": "EUR"})));

        let multiple = field.clone().multiple();
        let value = parse_response(r#"{"price": {"amount": 50, "currency": "EUR"}}"#, &multiple);
        assert_eq!(value, Some(json!([{"amount": 50, "currency": "EUR"}])));
    }

    #[test]
    fn test_null_and_missing_key() {
        let field = FieldDefinition::new("title", "Titel");
        assert_eq!(parse_response(r#"{"title": null}"#, &field), None);
        assert_eq!(parse_response(r#"{"other": "x"}"#, &field), None);
        assert_eq!(parse_response(r#"{"title": "   "}"#, &field), None);
        assert_eq!(parse_response(r#"{"title": []}"#, &field), None);
    }

    #[test]
    fn test_multiple_wraps_string() {
        let field = FieldDefinition::new("keywords", "Schlagworte").multiple();
        assert_eq!(parse_response(r#"{"keywords": "Python"}"#, &field), Some(json!(["Python"])));
        assert_eq!(parse_response(r#"{"keywords": 42}"#, &field), None);
        assert_eq!(parse_response(r#"{"keywords": ["", " "]}"#, &field), None);
    }

    #[test]
    fn test_scalar_passthrough() {
        let field = FieldDefinition::new("duration", "Dauer").with_datatype("number");
        assert_eq!(parse_response(r#"{"duration": 90}"#, &field), Some(json!(90)));
    }

    #[test]
    fn test_json_surrounded_by_prose() {
        let field = FieldDefinition::new("title", "Titel");
        let response = "Hier ist das Ergebnis:\n```json\n{\"title\": \"Workshop\"}\n```";
        assert_eq!(parse_response(response, &field), Some(json!("Workshop")));
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("a {\"x\": 1} b"), Some("{\"x\": 1}"));
        assert_eq!(extract_json_object("} before {"), None);
        assert_eq!(extract_json_object("no braces"), None);
    }

    #[test]
    fn test_json_tier_errors() {
        let field = FieldDefinition::new("title", "Titel");
        assert_eq!(parse_json_tier("plain", &field), Err(ExtractorError::NoJsonObject));
        assert!(matches!(
            parse_json_tier("{broken", &field),
            Err(ExtractorError::NoJsonObject)
        ));
        assert!(matches!(
            parse_json_tier("{not: json}", &field),
            Err(ExtractorError::JsonParse(_))
        ));
    }

    #[test]
    fn test_malformed_json_falls_back_to_text() {
        let field = FieldDefinition::new("title", "Titel");
        assert_eq!(parse_response("{title: Workshop}", &field), Some(json!("{title: Workshop}")));
    }

    #[test]
    fn test_fallback_not_found() {
        let field = FieldDefinition::new("title", "Titel");
        assert_eq!(parse_text_fallback("null", &field), None);
        assert_eq!(parse_text_fallback("  ", &field), None);
        assert_eq!(parse_text_fallback("Nicht gefunden", &field), None);
        assert_eq!(parse_text_fallback(" Workshop ", &field), Some(json!("Workshop")));
    }

    #[test]
    fn test_fallback_array_split() {
        let field = FieldDefinition::new("keywords", "Schlagworte").with_datatype("array");
        assert_eq!(
            parse_text_fallback("Python, , Rust ,", &field),
            Some(json!(["Python", "Rust"]))
        );
        assert_eq!(parse_text_fallback(", ,", &field), None);
    }

    #[test]
    fn test_fallback_uri_pattern() {
        let field = FieldDefinition::new("url", "URL")
            .with_datatype("uri")
            .with_pattern("^https?://");
        assert_eq!(
            parse_text_fallback("https://example.org", &field),
            Some(json!("https://example.org"))
        );
        assert_eq!(parse_text_fallback("example.org", &field), None);

        let broken = FieldDefinition::new("url", "URL")
            .with_datatype("uri")
            .with_pattern("(");
        assert_eq!(parse_text_fallback("example.org", &broken), Some(json!("example.org")));
    }

    #[test]
    fn test_fallback_vocabulary() {
        let field = FieldDefinition::new("format", "Format").with_vocabulary(Vocabulary::closed(vec![
            Concept::new("Workshop").with_uri("http://w3id.org/format/workshop"),
            Concept::new("Webinar").with_alt_label("Online-Seminar"),
        ]));
        assert_eq!(
            parse_text_fallback("workshop", &field),
            Some(json!("http://w3id.org/format/workshop"))
        );
        assert_eq!(parse_text_fallback("online-seminar", &field), Some(json!("Webinar")));
        assert_eq!(parse_text_fallback("Seminar", &field), Some(json!("Seminar")));
    }

    proptest! {
        #[test]
        fn prop_never_returns_blank(response in ".{0,200}", multiple in any::<bool>()) {
            let mut field = FieldDefinition::new("x", "X");
            field.multiple = multiple;
            if let Some(value) = parse_response(&response, &field) {
                prop_assert!(is_value_filled(&value));
            }
        }

        #[test]
        fn prop_json_arrays_never_blank(items in proptest::collection::vec(prop_oneof![
            Just(Value::Null),
            Just(json!("")),
            Just(json!("  ")),
            "[a-z]{1,5}".prop_map(Value::String),
        ], 0..8)) {
            let field = FieldDefinition::new("x", "X").multiple();
            let response = json!({ "x": items }).to_string();
            if let Some(Value::Array(kept)) = parse_response(&response, &field) {
                prop_assert!(kept.iter().all(|v| !is_blank_element(v)));
                prop_assert!(!kept.is_empty());
            }
        }
    }
}
