//! Grouping of fields for display
//!
//! Groups are keyed by schema name and group id, so a "basic" group of the
//! core schema stays apart from a "basic" group of a special schema. Core
//! groups come first, then other schemas alphabetically, then group order.

use crate::state::{CanvasFieldState, FieldGroup};
use metacanvas_domain::field::CORE_SCHEMA_NAME;
use std::cmp::Ordering;

/// Build display groups from fields in their list order
pub fn group_fields<'a>(fields: impl Iterator<Item = &'a CanvasFieldState>) -> Vec<FieldGroup> {
    let mut groups: Vec<FieldGroup> = Vec::new();

    for field in fields {
        let def = &field.definition;
        match groups
            .iter_mut()
            .find(|g| g.schema_name == def.schema_name && g.id == def.group)
        {
            Some(group) => group.field_ids.push(def.id.clone()),
            None => groups.push(FieldGroup {
                id: def.group.clone(),
                label: def.group_label.clone(),
                schema_name: def.schema_name.clone(),
                order: def.group_order,
                field_ids: vec![def.id.clone()],
            }),
        }
    }

    groups.retain(|g| !g.field_ids.is_empty());
    groups.sort_by(compare_groups);
    groups
}

fn compare_groups(a: &FieldGroup, b: &FieldGroup) -> Ordering {
    let a_core = a.schema_name == CORE_SCHEMA_NAME;
    let b_core = b.schema_name == CORE_SCHEMA_NAME;

    b_core
        .cmp(&a_core)
        .then_with(|| a.schema_name.cmp(&b.schema_name))
        .then_with(|| a.order.cmp(&b.order))
}
