//! Extraction orchestration
//!
//! A `Canvas` runs one extraction batch per source text:
//!
//! 1. Core fields are initialized from the core schema.
//! 2. One LLM call detects the content type; an accepted detection loads the
//!    matching special schema and fills the content-type field.
//! 3. Every core and special field is submitted to the worker pool. Results
//!    are written to the store as they arrive.
//!
//! Manual edits go through [`Canvas::update_field_value`], which normalizes
//! the value against the field's constraints.

use crate::config::CanvasConfig;
use crate::content_type::{detection_prompt, parse_detection};
use crate::error::CanvasError;
use crate::init::{load_fields, schema_display_name};
use crate::normalizer::normalize_value;
use crate::serialize;
use crate::shape::{apply_expansion, reconstruct};
use crate::state::CanvasState;
use crate::store::CanvasStore;
use futures::future::join_all;
use metacanvas_domain::field::CORE_SCHEMA_NAME;
use metacanvas_domain::traits::{LlmProvider, SchemaSource};
use metacanvas_domain::{Datatype, FieldDefinition};
use metacanvas_extractor::{ExtractionResult, ExtractionTask, ExtractorConfig, PoolStatus, WorkerPool};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Message stored on a field whose task never produced a result
const EXTRACTION_FAILED: &str = "Extraction failed";

/// Extraction session over one schema source
pub struct Canvas<L, S>
where
    L: LlmProvider + 'static,
    S: SchemaSource,
{
    llm: Arc<L>,
    schemas: Arc<S>,
    pool: WorkerPool<L>,
    store: CanvasStore,
    config: CanvasConfig,
    extractor_config: ExtractorConfig,
}

impl<L, S> Canvas<L, S>
where
    L: LlmProvider + 'static,
    S: SchemaSource,
{
    /// Create a canvas with an empty state
    pub fn new(
        llm: Arc<L>,
        schemas: Arc<S>,
        config: CanvasConfig,
        extractor_config: ExtractorConfig,
    ) -> Self {
        let pool = WorkerPool::new(Arc::clone(&llm), &extractor_config);
        Self {
            llm,
            schemas,
            pool,
            store: CanvasStore::new(),
            config,
            extractor_config,
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<CanvasState> {
        self.store.snapshot()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<Arc<CanvasState>> {
        self.store.subscribe()
    }

    /// Worker pool counters
    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Change the number of concurrent extractions
    pub fn set_max_workers(&self, max_workers: usize) {
        self.pool.set_max_workers(max_workers);
    }

    /// Canvas configuration
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Run a full extraction batch over `text`
    ///
    /// Field-level failures are recorded on the fields and never abort the
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the core schema or the detected special schema
    /// cannot be loaded.
    pub async fn start_extraction(&self, text: &str) -> Result<(), CanvasError> {
        info!("Starting extraction ({} characters)", text.chars().count());

        self.store.update(|state| {
            state.source_text = text.to_string();
            state.is_extracting = true;
            state.detected_content_type = None;
            state.content_type_confidence = 0.0;
            state.selected_content_type = None;
            state.special_fields.clear();
        });

        let result = self.run_batch(text).await;
        let (filled, total) = self.store.update(|state| {
            state.is_extracting = false;
            (state.filled_fields, state.total_fields)
        });

        match &result {
            Ok(()) => info!("Extraction complete: {}/{} fields filled", filled, total),
            Err(e) => error!("Extraction aborted: {}", e),
        }
        result
    }

    async fn run_batch(&self, text: &str) -> Result<(), CanvasError> {
        self.initialize_core_fields()?;

        if let Some(schema_file) = self.detect_content_type(text).await {
            self.load_special_schema(&schema_file)?;
            let confidence = self.store.snapshot().content_type_confidence;
            self.fill_content_type_field(&schema_file, confidence);
        }

        let snapshot = self.store.snapshot();
        let core: Vec<Arc<FieldDefinition>> = snapshot
            .core_fields
            .iter()
            .filter(|f| f.id() != self.config.content_type_field)
            .map(|f| Arc::clone(&f.definition))
            .collect();
        let special: Vec<Arc<FieldDefinition>> = snapshot
            .special_fields
            .iter()
            .map(|f| Arc::clone(&f.definition))
            .collect();

        debug!("Submitting {} core and {} special fields", core.len(), special.len());
        futures::join!(self.extract_fields(core, text), self.extract_fields(special, text));
        Ok(())
    }

    fn initialize_core_fields(&self) -> Result<(), CanvasError> {
        let core_schema = &self.config.core_schema;
        let fields = load_fields(self.schemas.as_ref(), core_schema, CORE_SCHEMA_NAME)?;
        let template = self.schemas.output_template(core_schema)?;
        info!("Initialized {} core fields", fields.len());

        self.store.update(|state| {
            state.core_fields = fields;
            state.metadata = template;
        });
        Ok(())
    }

    /// Classify `text` into a special schema
    ///
    /// Returns the schema file of an accepted detection. Failed calls,
    /// unreadable answers and schema files that were not offered count as
    /// "no content type".
    pub async fn detect_content_type(&self, text: &str) -> Option<String> {
        let concepts = self.schemas.content_type_concepts();
        let has_schema_concepts = concepts
            .iter()
            .any(|c| c.schema_file.as_deref().is_some_and(|f| !f.is_empty()));
        let special_schemas = if has_schema_concepts {
            Vec::new()
        } else {
            self.schemas.available_special_schemas()
        };

        if !has_schema_concepts && special_schemas.is_empty() {
            debug!("No content types to choose from");
            return None;
        }

        let offered: Vec<&str> = if has_schema_concepts {
            concepts
                .iter()
                .filter_map(|c| c.schema_file.as_deref())
                .filter(|f| !f.is_empty())
                .collect()
        } else {
            special_schemas.iter().map(String::as_str).collect()
        };

        let prompt = detection_prompt(text, &concepts, &special_schemas, &self.config.core_schema);
        let response = match self.llm.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Content-type detection failed: {}", e);
                return None;
            }
        };

        let Some(detection) = parse_detection(&response) else {
            warn!("Content-type detection returned no JSON object");
            return None;
        };

        if !detection.is_accepted(self.config.detection_threshold) {
            info!(
                "No content type detected ({} at {:.2})",
                detection.schema, detection.confidence
            );
            return None;
        }

        if !offered.contains(&detection.schema.as_str()) {
            warn!(
                "Content-type detection named {} which was not offered",
                detection.schema
            );
            return None;
        }

        info!(
            "Content type detected: {} ({:.0}%)",
            detection.schema,
            detection.confidence * 100.0
        );
        self.store.update(|state| {
            state.detected_content_type = Some(detection.schema.clone());
            state.content_type_confidence = detection.confidence;
            state.selected_content_type = Some(detection.schema.clone());
        });
        Some(detection.schema)
    }

    fn load_special_schema(&self, schema_file: &str) -> Result<(), CanvasError> {
        let name = schema_display_name(schema_file, &self.config.core_schema);
        let fields = load_fields(self.schemas.as_ref(), schema_file, &name)?;
        let template = self.schemas.output_template(schema_file)?;
        info!("Loaded special schema {} with {} fields", schema_file, fields.len());

        self.store.update(|state| {
            state.special_fields = fields;
            state.metadata.extend(template);
            state.selected_content_type = Some(schema_file.to_string());
        });
        Ok(())
    }

    /// Drop the special fields and their metadata entries
    fn clear_special_fields(&self) {
        self.store.update(|state| {
            let ids: Vec<String> = state
                .special_fields
                .iter()
                .map(|f| f.id().to_string())
                .collect();
            for id in ids {
                state.metadata.remove(&id);
            }
            state.special_fields.clear();
        });
    }

    /// Set the content-type field to the concept that selects `schema_file`
    fn fill_content_type_field(&self, schema_file: &str, confidence: f64) {
        let field_id = self.config.content_type_field.as_str();
        let filled = self.store.update(|state| {
            let value = match state
                .field(field_id)
                .and_then(|f| f.definition.vocabulary.as_ref())
                .and_then(|v| v.by_schema_file(schema_file))
            {
                Some(concept) => Value::String(concept.canonical_value().to_string()),
                None => return false,
            };

            let stored = match state.field_mut(field_id) {
                Some(field) => {
                    field.set_value(Some(value), confidence);
                    field.value.clone()
                }
                None => return false,
            };
            state.metadata.insert(field_id.to_string(), stored);
            true
        });

        if filled {
            debug!("Content-type field {} set for {}", field_id, schema_file);
        } else {
            debug!("No content-type concept names {}", schema_file);
        }
    }

    async fn extract_fields(&self, fields: Vec<Arc<FieldDefinition>>, text: &str) {
        if fields.is_empty() {
            return;
        }

        let source: Arc<str> = Arc::from(text);
        join_all(fields.into_iter().map(|field| {
            let task = ExtractionTask::for_field(field, Arc::clone(&source), &self.extractor_config);
            self.extract_field(task)
        }))
        .await;
    }

    /// Extract one field through the pool and store the result
    pub async fn extract_field(&self, task: ExtractionTask) {
        let field_id = task.field_id().to_string();
        self.store.update(|state| {
            if let Some(field) = state.field_mut(&field_id) {
                field.mark_extracting();
            }
        });

        match self.pool.submit(task).await {
            Ok(result) => self.apply_result(result),
            Err(e) => {
                warn!("Extraction of {} did not complete: {}", field_id, e);
                self.store.update(|state| {
                    if let Some(field) = state.field_mut(&field_id) {
                        field.set_error(EXTRACTION_FAILED);
                    }
                });
            }
        }
    }

    fn apply_result(&self, result: ExtractionResult) {
        self.store.update(|state| {
            let stored = {
                let Some(field) = state.field_mut(&result.field_id) else {
                    debug!("Dropping result for unknown field {}", result.field_id);
                    return;
                };

                if let Some(message) = result.error.as_ref() {
                    field.set_error(message.clone());
                    return;
                }

                field.set_value(result.value.clone(), result.confidence);
                if !field.is_filled() {
                    return;
                }
                if field.definition.has_shape() {
                    let created = apply_expansion(field, result.confidence);
                    if created > 0 {
                        debug!("Expanded {} into {} sub-fields", result.field_id, created);
                    }
                }
                field.value.clone()
            };
            state.metadata.insert(result.field_id.clone(), stored);
        });
    }

    /// Apply a manual edit
    ///
    /// `field_id` names a top-level field or a sub-field as
    /// `"<parent>.<sub>"`. Values are normalized first; a value rejected by a
    /// controlled vocabulary leaves the field empty. Editing the
    /// content-type field switches the special schema.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::FieldNotFound`] for unknown ids, or an error if
    /// a newly selected special schema cannot be loaded.
    pub async fn update_field_value(&self, field_id: &str, value: Value) -> Result<(), CanvasError> {
        if field_id == self.config.content_type_field {
            let found = self.store.update(|state| {
                let stored = match state.field_mut(field_id) {
                    Some(field) => {
                        field.set_value(Some(value.clone()), 1.0);
                        field.value.clone()
                    }
                    None => return false,
                };
                state.metadata.insert(field_id.to_string(), stored);
                true
            });
            if !found {
                return Err(CanvasError::FieldNotFound(field_id.to_string()));
            }
            return self.on_content_type_change(&value).await;
        }

        let snapshot = self.store.snapshot();
        if let Some(field) = snapshot.field(field_id) {
            self.apply_manual_value(field_id, &field.definition, &value);
            return Ok(());
        }

        if let Some((parent_id, sub_id)) = field_id.rsplit_once('.') {
            if let Some(sub) = snapshot.field(parent_id).and_then(|p| p.sub_field(sub_id)) {
                self.apply_sub_field_value(parent_id, sub_id, &sub.definition, &value);
                return Ok(());
            }
        }

        Err(CanvasError::FieldNotFound(field_id.to_string()))
    }

    fn apply_manual_value(&self, field_id: &str, definition: &FieldDefinition, value: &Value) {
        let composite = definition.has_shape() || definition.datatype == Datatype::Object;
        let normalized = if composite {
            Some(value.clone()).filter(|v| !v.is_null())
        } else {
            normalize_value(definition, value)
        };

        if normalized.is_none() && !value.is_null() {
            debug!("Manual value for {} normalized to empty", field_id);
        }

        self.store.update(|state| {
            let stored = {
                let Some(field) = state.field_mut(field_id) else {
                    return;
                };
                field.set_value(normalized, 1.0);
                if definition.has_shape() {
                    field.is_parent = false;
                    field.sub_fields.clear();
                    if field.is_filled() {
                        apply_expansion(field, 1.0);
                    }
                }
                field.value.clone()
            };
            state.metadata.insert(field_id.to_string(), stored);
        });
    }

    fn apply_sub_field_value(
        &self,
        parent_id: &str,
        sub_id: &str,
        definition: &FieldDefinition,
        value: &Value,
    ) {
        let normalized = if definition.datatype == Datatype::Object {
            Some(value.clone()).filter(|v| !v.is_null())
        } else {
            normalize_value(definition, value)
        };

        self.store.update(|state| {
            let stored = {
                let Some(parent) = state.field_mut(parent_id) else {
                    return;
                };
                let Some(sub) = parent.sub_field_mut(sub_id) else {
                    return;
                };
                sub.set_value(normalized, 1.0);
                reconstruct(parent)
            };
            state.metadata.insert(parent_id.to_string(), stored);
        });
    }

    /// React to a new content-type value by switching the special schema
    async fn on_content_type_change(&self, value: &Value) -> Result<(), CanvasError> {
        let selected = match value {
            Value::Array(items) => items.first().and_then(Value::as_str),
            other => other.as_str(),
        };
        let Some(selected) = selected.filter(|s| !s.trim().is_empty()) else {
            debug!("Content type cleared");
            return Ok(());
        };

        let snapshot = self.store.snapshot();
        let schema_file = snapshot
            .field(&self.config.content_type_field)
            .and_then(|f| f.definition.vocabulary.as_ref())
            .and_then(|v| v.resolve(selected))
            .and_then(|c| c.schema_file.clone())
            .filter(|f| !f.is_empty());

        match schema_file {
            Some(schema_file) => self.switch_special_schema(&schema_file, &snapshot.source_text).await,
            None => {
                debug!("Content type {} selects no special schema", selected);
                Ok(())
            }
        }
    }

    /// Select a special schema by hand and re-extract its fields
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be loaded.
    pub async fn change_content_type_manually(&self, schema_file: &str) -> Result<(), CanvasError> {
        info!("Content type changed manually to {}", schema_file);
        let text = self.store.snapshot().source_text.clone();
        self.switch_special_schema(schema_file, &text).await?;
        self.fill_content_type_field(schema_file, 1.0);
        Ok(())
    }

    async fn switch_special_schema(&self, schema_file: &str, text: &str) -> Result<(), CanvasError> {
        self.clear_special_fields();
        self.load_special_schema(schema_file)?;

        if text.trim().is_empty() {
            return Ok(());
        }

        let special: Vec<Arc<FieldDefinition>> = self
            .store
            .snapshot()
            .special_fields
            .iter()
            .map(|f| Arc::clone(&f.definition))
            .collect();

        self.store.update(|state| state.is_extracting = true);
        self.extract_fields(special, text).await;
        self.store.update(|state| state.is_extracting = false);
        Ok(())
    }

    /// Enriched metadata document of the current state
    pub fn enriched_metadata(&self) -> Map<String, Value> {
        serialize::enriched_metadata(&self.store.snapshot())
    }

    /// Pretty-printed enriched metadata document
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn metadata_json(&self) -> Result<String, CanvasError> {
        Ok(serialize::metadata_json(&self.store.snapshot())?)
    }

    /// Discard queued tasks and return to the initial state
    pub fn reset(&self) {
        let dropped = self.pool.clear_queue();
        if dropped > 0 {
            info!("Discarded {} queued extraction tasks", dropped);
        }
        self.store.reset();
    }
}
