//! Field initialization from schema records

use crate::state::CanvasFieldState;
use metacanvas_domain::field::{DEFAULT_GROUP, DEFAULT_GROUP_LABEL, DEFAULT_GROUP_ORDER};
use metacanvas_domain::schema::ShapeSpec;
use metacanvas_domain::traits::SchemaSource;
use metacanvas_domain::{
    FieldDefinition, SchemaError, SchemaField, SchemaGroup, Vocabulary, VocabularyType,
};
use std::sync::Arc;
use tracing::debug;

/// Display name of a schema: "Core" for the core schema, otherwise the file
/// stem split on `_` with each word capitalized ("learning_material.json"
/// becomes "Learning Material")
pub fn schema_display_name(schema_file: &str, core_schema: &str) -> String {
    if schema_file == core_schema {
        return metacanvas_domain::field::CORE_SCHEMA_NAME.to_string();
    }

    schema_file
        .trim_end_matches(".json")
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a schema field is shown and extracted at all
pub fn is_presented(raw: &SchemaField) -> bool {
    raw.system.ai_fillable != Some(false) && raw.system.ask_user != Some(false)
}

/// Convert a schema record into a field definition
pub fn field_definition(raw: &SchemaField, groups: &[SchemaGroup], schema_name: &str) -> FieldDefinition {
    let system = &raw.system;
    let group_id = raw.group.clone().unwrap_or_else(|| DEFAULT_GROUP.to_string());
    let group_index = groups.iter().position(|g| g.id == group_id);

    let group_label = raw
        .group_label
        .clone()
        .filter(|l| !l.is_empty())
        .or_else(|| {
            group_index
                .map(|i| groups[i].label.clone())
                .filter(|l| !l.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_GROUP_LABEL.to_string());

    let label = raw
        .prompt
        .label
        .clone()
        .or_else(|| raw.label.clone())
        .unwrap_or_else(|| raw.id.clone());

    let datatype = system
        .datatype
        .clone()
        .or_else(|| raw.field_type.clone())
        .unwrap_or_else(|| "string".to_string());

    let mut definition = FieldDefinition::new(raw.id.clone(), label)
        .with_description(raw.prompt.description.clone().unwrap_or_default())
        .with_datatype(datatype)
        .in_group(group_id, group_label, group_index.unwrap_or(DEFAULT_GROUP_ORDER))
        .in_schema(schema_name);

    definition.uri = Some(system.uri.clone().unwrap_or_else(|| raw.id.clone()));
    definition.multiple = system.multiple;
    definition.required = system.required.unwrap_or(false) || raw.required;
    definition.validation = system.validation.clone();
    definition.examples = raw.prompt.examples.clone();
    definition.vocabulary = system.vocabulary.as_ref().map(|v| Vocabulary {
        vocab_type: VocabularyType::parse_lenient(&v.vocab_type),
        concepts: v.concepts.clone(),
    });
    definition.shape = system
        .items
        .as_ref()
        .and_then(|items| items.shape.as_ref())
        .map(|spec| shape_definitions(spec, &definition));

    definition
}

fn shape_definitions(spec: &ShapeSpec, parent: &FieldDefinition) -> Vec<FieldDefinition> {
    spec.entries()
        .into_iter()
        .filter(|entry| !entry.id.is_empty())
        .map(|entry| {
            let label = entry.label.clone().unwrap_or_else(|| entry.id.clone());
            let mut sub = FieldDefinition::new(entry.id.clone(), label)
                .with_description(entry.description.clone().unwrap_or_default())
                .with_datatype(entry.datatype.clone().unwrap_or_else(|| "string".to_string()))
                .in_group(parent.group.clone(), parent.group_label.clone(), parent.group_order)
                .in_schema(parent.schema_name.clone());
            sub.required = entry.required;
            sub.multiple = entry.multiple;
            sub.shape = entry.shape.as_deref().map(|nested| shape_definitions(nested, &sub));
            sub
        })
        .collect()
}

/// Load a schema's presented fields as empty field states
///
/// # Errors
///
/// Returns an error if the schema's fields or groups cannot be loaded.
pub fn load_fields<S>(
    source: &S,
    schema_file: &str,
    schema_name: &str,
) -> Result<Vec<CanvasFieldState>, SchemaError>
where
    S: SchemaSource + ?Sized,
{
    let raw_fields = source.fields(schema_file)?;
    let groups = source.groups(schema_file)?;

    let fields: Vec<CanvasFieldState> = raw_fields
        .iter()
        .filter(|raw| is_presented(raw))
        .map(|raw| {
            let definition = field_definition(raw, &groups, schema_name);
            debug!(
                "Field {}: group={} label={} order={}",
                definition.id, definition.group, definition.group_label, definition.group_order
            );
            CanvasFieldState::new(Arc::new(definition))
        })
        .collect();

    debug!(
        "Initialized {} of {} fields from {}",
        fields.len(),
        raw_fields.len(),
        schema_file
    );
    Ok(fields)
}
