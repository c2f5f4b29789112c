//! Schemas command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use metacanvas_canvas::SchemaDirectory;
use metacanvas_domain::traits::SchemaSource;
use std::path::PathBuf;

/// Execute the schemas command.
pub fn execute_schemas(config: &Config, schema_dir: PathBuf, formatter: &Formatter) -> Result<()> {
    let source = SchemaDirectory::new(schema_dir, &config.canvas);
    println!("{}", formatter.schema_list(&content_types(&source)));
    Ok(())
}

/// Special schemas with the label of the content type that selects them
///
/// Schema files no concept points to are listed without a label.
pub fn content_types<S: SchemaSource + ?Sized>(source: &S) -> Vec<(String, Option<String>)> {
    let concepts = source.content_type_concepts();
    let mut listed: Vec<(String, Option<String>)> = concepts
        .iter()
        .filter_map(|c| {
            let file = c.schema_file.as_deref().filter(|f| !f.is_empty())?;
            Some((file.to_string(), Some(c.label.clone())))
        })
        .collect();

    for file in source.available_special_schemas() {
        if !listed.iter().any(|(listed_file, _)| *listed_file == file) {
            listed.push((file, None));
        }
    }
    listed
}

#[cfg(test)]
mod tests {
    use super::*;
    use metacanvas_canvas::{CanvasConfig, StaticSchemaSource};
    use metacanvas_domain::SchemaDocument;
    use serde_json::json;

    #[test]
    fn test_content_types() {
        let core: SchemaDocument = serde_json::from_value(json!({
            "fields": [{"id": "ccm:oeh_flex_lrt", "system": {"vocabulary": {"concepts": [
                {"label": "Veranstaltung", "schema_file": "event.json"},
                {"label": "Sonstiges"}
            ]}}}]
        }))
        .unwrap();
        let source = StaticSchemaSource::new(&CanvasConfig::default())
            .with_schema("core.json", core)
            .with_schema("event.json", SchemaDocument::default())
            .with_schema("tool.json", SchemaDocument::default());

        assert_eq!(
            content_types(&source),
            vec![
                ("event.json".to_string(), Some("Veranstaltung".to_string())),
                ("tool.json".to_string(), None),
            ]
        );
    }
}
