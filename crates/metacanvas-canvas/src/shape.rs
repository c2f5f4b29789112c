//! Expansion of composite values into sub-fields, and the way back
//!
//! A field whose definition carries a shape gets one sub-field per shape
//! entry once it holds a single object. Sub-fields are edited individually;
//! the composite value is rebuilt from their current values when serializing.
//! Values holding several objects are not expanded and stay as stored.

use crate::state::CanvasFieldState;
use metacanvas_domain::FieldDefinition;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Create sub-field states from a composite value
///
/// Returns an empty list when the field has no shape or the value is not
/// exactly one object, either bare or as the only element of an array.
pub fn expand(field: &FieldDefinition, value: &Value, confidence: f64) -> Vec<CanvasFieldState> {
    let Some(shape) = field.shape.as_ref().filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    let Some(object) = composite_object(value) else {
        return Vec::new();
    };

    shape
        .iter()
        .map(|sub| {
            let mut state = CanvasFieldState::new(Arc::new(sub.clone()));
            let sub_value = object.get(&sub.id).cloned().filter(|v| !v.is_null());
            state.set_value(sub_value, confidence);
            state
        })
        .collect()
}

fn composite_object(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) if items.len() == 1 => items[0].as_object(),
        _ => None,
    }
}

/// Rebuild the composite value from the parent's sub-fields
///
/// Multi-valued parents yield a one-element array, the inverse of [`expand`].
pub fn reconstruct(parent: &CanvasFieldState) -> Value {
    let object: Map<String, Value> = parent
        .sub_fields
        .iter()
        .map(|sub| (sub.id().to_string(), sub.value.clone()))
        .collect();

    if parent.definition.multiple {
        Value::Array(vec![Value::Object(object)])
    } else {
        Value::Object(object)
    }
}

/// Expand `value` into the parent's sub-fields, marking it as a parent
///
/// Returns the number of sub-fields created. A value without an object
/// leaves the field untouched.
pub fn apply_expansion(parent: &mut CanvasFieldState, confidence: f64) -> usize {
    let sub_fields = expand(&parent.definition, &parent.value, confidence);
    if sub_fields.is_empty() {
        return 0;
    }
    parent.is_parent = true;
    parent.sub_fields = sub_fields;
    parent.sub_fields.len()
}
