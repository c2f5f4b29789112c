//! Schema sources
//!
//! - `StaticSchemaSource`: schemas held in memory
//! - `SchemaDirectory`: one JSON document per schema file in a directory
//!
//! Content-type concepts come from the vocabulary of the content-type field
//! in the core schema.

use crate::config::CanvasConfig;
use metacanvas_domain::traits::SchemaSource;
use metacanvas_domain::{Concept, SchemaDocument, SchemaError, SchemaField, SchemaGroup};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

fn content_type_concepts_of(document: &SchemaDocument, field_id: &str) -> Vec<Concept> {
    document
        .fields
        .iter()
        .find(|f| f.id == field_id)
        .and_then(|f| f.system.vocabulary.as_ref())
        .map(|v| v.concepts.clone())
        .unwrap_or_default()
}

/// In-memory schema source
#[derive(Debug, Clone)]
pub struct StaticSchemaSource {
    core_schema: String,
    content_type_field: String,
    documents: HashMap<String, SchemaDocument>,
}

impl StaticSchemaSource {
    /// Create an empty source using the configured core schema and content-type field
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            core_schema: config.core_schema.clone(),
            content_type_field: config.content_type_field.clone(),
            documents: HashMap::new(),
        }
    }

    /// Add or replace a schema document
    pub fn with_schema(mut self, schema_file: impl Into<String>, document: SchemaDocument) -> Self {
        self.documents.insert(schema_file.into(), document);
        self
    }

    fn document(&self, schema_file: &str) -> Result<&SchemaDocument, SchemaError> {
        self.documents
            .get(schema_file)
            .ok_or_else(|| SchemaError::NotFound(schema_file.to_string()))
    }
}

impl SchemaSource for StaticSchemaSource {
    fn fields(&self, schema_file: &str) -> Result<Vec<SchemaField>, SchemaError> {
        Ok(self.document(schema_file)?.fields.clone())
    }

    fn groups(&self, schema_file: &str) -> Result<Vec<SchemaGroup>, SchemaError> {
        Ok(self.document(schema_file)?.groups.clone())
    }

    fn output_template(&self, schema_file: &str) -> Result<Map<String, Value>, SchemaError> {
        Ok(self.document(schema_file)?.output_template.clone())
    }

    fn content_type_concepts(&self) -> Vec<Concept> {
        self.documents
            .get(&self.core_schema)
            .map(|doc| content_type_concepts_of(doc, &self.content_type_field))
            .unwrap_or_default()
    }

    fn available_special_schemas(&self) -> Vec<String> {
        let mut files: Vec<String> = self
            .documents
            .keys()
            .filter(|f| **f != self.core_schema)
            .cloned()
            .collect();
        files.sort();
        files
    }
}

/// Schema files read from a directory, parsed once and cached
#[derive(Debug)]
pub struct SchemaDirectory {
    root: PathBuf,
    core_schema: String,
    content_type_field: String,
    cache: Mutex<HashMap<String, Arc<SchemaDocument>>>,
}

impl SchemaDirectory {
    /// Create a source reading from `root`
    pub fn new(root: impl Into<PathBuf>, config: &CanvasConfig) -> Self {
        Self {
            root: root.into(),
            core_schema: config.core_schema.clone(),
            content_type_field: config.content_type_field.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Directory the schemas are read from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load (or fetch from cache) one schema document
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a plain file name, the file does
    /// not exist, or it is not a valid schema document.
    pub fn document(&self, schema_file: &str) -> Result<Arc<SchemaDocument>, SchemaError> {
        if let Some(doc) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(schema_file)
        {
            return Ok(Arc::clone(doc));
        }

        if Path::new(schema_file).file_name().and_then(|n| n.to_str()) != Some(schema_file) {
            return Err(SchemaError::NotFound(schema_file.to_string()));
        }

        let path = self.root.join(schema_file);
        let text = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SchemaError::NotFound(schema_file.to_string()),
            _ => SchemaError::Io(format!("{}: {}", path.display(), e)),
        })?;
        let document: SchemaDocument = serde_json::from_str(&text)
            .map_err(|e| SchemaError::Parse(format!("{}: {}", schema_file, e)))?;

        info!(
            "Loaded schema {} ({} fields, {} groups)",
            schema_file,
            document.fields.len(),
            document.groups.len()
        );

        let document = Arc::new(document);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(schema_file.to_string(), Arc::clone(&document));
        Ok(document)
    }
}

impl SchemaSource for SchemaDirectory {
    fn fields(&self, schema_file: &str) -> Result<Vec<SchemaField>, SchemaError> {
        Ok(self.document(schema_file)?.fields.clone())
    }

    fn groups(&self, schema_file: &str) -> Result<Vec<SchemaGroup>, SchemaError> {
        Ok(self.document(schema_file)?.groups.clone())
    }

    fn output_template(&self, schema_file: &str) -> Result<Map<String, Value>, SchemaError> {
        Ok(self.document(schema_file)?.output_template.clone())
    }

    fn content_type_concepts(&self) -> Vec<Concept> {
        match self.document(&self.core_schema) {
            Ok(doc) => content_type_concepts_of(&doc, &self.content_type_field),
            Err(e) => {
                warn!("No content-type concepts: {}", e);
                Vec::new()
            }
        }
    }

    fn available_special_schemas(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list schema directory {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json") && *name != self.core_schema)
            .collect();
        files.sort();
        debug!("Special schemas available: {:?}", files);
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn core_document() -> Value {
        json!({
            "groups": [{"id": "basic", "label": "Grunddaten"}],
            "fields": [
                {"id": "cclom:title", "group": "basic", "system": {"required": true}},
                {
                    "id": "ccm:oeh_flex_lrt",
                    "system": {"vocabulary": {"type": "skos", "concepts": [
                        {"label": "Veranstaltung", "uri": "http://w3id.org/lrt/event", "schema_file": "event.json"}
                    ]}}
                }
            ],
            "output_template": {"cclom:title": null}
        })
    }

    fn write(dir: &TempDir, name: &str, value: &Value) {
        std::fs::write(dir.path().join(name), value.to_string()).unwrap();
    }

    #[test]
    fn test_static_source() {
        let doc: SchemaDocument = serde_json::from_value(core_document()).unwrap();
        let source = StaticSchemaSource::new(&CanvasConfig::default())
            .with_schema("core.json", doc)
            .with_schema("event.json", SchemaDocument::default());

        assert_eq!(source.fields("core.json").unwrap().len(), 2);
        assert_eq!(source.groups("core.json").unwrap()[0].label, "Grunddaten");
        assert!(source.output_template("core.json").unwrap().contains_key("cclom:title"));
        assert_eq!(source.content_type_concepts()[0].label, "Veranstaltung");
        assert_eq!(source.available_special_schemas(), vec!["event.json"]);
        assert_eq!(
            source.fields("missing.json"),
            Err(SchemaError::NotFound("missing.json".to_string()))
        );
    }

    #[test]
    fn test_directory_source() {
        let dir = TempDir::new().unwrap();
        write(&dir, "core.json", &core_document());
        write(&dir, "event.json", &json!({"fields": [{"id": "schema:startDate"}]}));
        write(&dir, "course.json", &json!({}));
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = SchemaDirectory::new(dir.path(), &CanvasConfig::default());

        assert_eq!(source.fields("event.json").unwrap()[0].id, "schema:startDate");
        assert_eq!(
            source.content_type_concepts()[0].schema_file.as_deref(),
            Some("event.json")
        );
        assert_eq!(source.available_special_schemas(), vec!["course.json", "event.json"]);
    }

    #[test]
    fn test_directory_errors() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let source = SchemaDirectory::new(dir.path(), &CanvasConfig::default());

        assert!(matches!(source.fields("missing.json"), Err(SchemaError::NotFound(_))));
        assert!(matches!(source.fields("broken.json"), Err(SchemaError::Parse(_))));
        assert!(matches!(source.fields("../core.json"), Err(SchemaError::NotFound(_))));
        assert!(source.content_type_concepts().is_empty());
    }

    #[test]
    fn test_directory_caches_documents() {
        let dir = TempDir::new().unwrap();
        write(&dir, "event.json", &json!({"fields": [{"id": "a"}]}));
        let source = SchemaDirectory::new(dir.path(), &CanvasConfig::default());

        assert_eq!(source.fields("event.json").unwrap().len(), 1);
        std::fs::remove_file(dir.path().join("event.json")).unwrap();
        assert_eq!(source.fields("event.json").unwrap().len(), 1);
    }
}
