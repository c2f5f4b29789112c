//! Field status and the "meaningfully non-empty" predicate

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Runtime status of a field
///
/// Transitions: `Empty -> Extracting -> Filled | Error`. A filled field may go
/// back to `Empty` when a later edit clears it, or to `Extracting` when it is
/// re-extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    /// No value yet
    #[default]
    Empty,
    /// An extraction task is pending or running
    Extracting,
    /// Holds a meaningfully non-empty value
    Filled,
    /// The last extraction failed
    Error,
}

impl FieldStatus {
    /// Status implied by a value: `Filled` if it passes [`is_value_filled`]
    pub fn for_value(value: &Value) -> Self {
        if is_value_filled(value) {
            FieldStatus::Filled
        } else {
            FieldStatus::Empty
        }
    }

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldStatus::Empty => "empty",
            FieldStatus::Extracting => "extracting",
            FieldStatus::Filled => "filled",
            FieldStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a value counts as filled
///
/// Null, blank strings, empty arrays and arrays whose elements are all null or
/// blank are not filled. Everything else is.
pub fn is_value_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => items.iter().any(|item| !is_blank_element(item)),
        _ => true,
    }
}

/// Whether an array element is null or blank after trimming
pub fn is_blank_element(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_default_status_is_empty() {
        assert_eq!(FieldStatus::default(), FieldStatus::Empty);
    }

    #[test]
    fn test_filled_predicate() {
        assert!(!is_value_filled(&Value::Null));
        assert!(!is_value_filled(&json!("")));
        assert!(!is_value_filled(&json!("   ")));
        assert!(!is_value_filled(&json!([])));
        assert!(!is_value_filled(&json!(["", null, "  "])));

        assert!(is_value_filled(&json!("Berlin")));
        assert!(is_value_filled(&json!(["", "A"])));
        assert!(is_value_filled(&json!(0)));
        assert!(is_value_filled(&json!(false)));
        assert!(is_value_filled(&json!({})));
    }

    #[test]
    fn test_status_for_value() {
        assert_eq!(FieldStatus::for_value(&json!("x")), FieldStatus::Filled);
        assert_eq!(FieldStatus::for_value(&json!([null])), FieldStatus::Empty);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&FieldStatus::Extracting).unwrap(),
            "\"extracting\""
        );
    }

    proptest! {
        #[test]
        fn prop_non_blank_string_is_filled(s in "\\PC*") {
            prop_assert_eq!(is_value_filled(&json!(s.clone())), !s.trim().is_empty());
        }

        #[test]
        fn prop_array_filled_iff_any_non_blank(items in proptest::collection::vec("[ a-z]{0,3}", 0..6)) {
            let expected = items.iter().any(|s| !s.trim().is_empty());
            prop_assert_eq!(is_value_filled(&json!(items)), expected);
        }
    }
}
