//! Metacanvas Canvas
//!
//! The canvas owns the extraction state of one source text and drives the
//! extraction pipeline over it.
//!
//! ## Pipeline
//!
//! ```text
//! text → core fields → content-type detection → special fields
//!      → worker pool (prompt → LLM → parser) → state store → enriched JSON
//! ```
//!
//! ## Architecture
//!
//! - Schemas come from a [`SchemaSource`](metacanvas_domain::traits::SchemaSource):
//!   in memory ([`StaticSchemaSource`]) or a directory of JSON files
//!   ([`SchemaDirectory`])
//! - All state lives in a [`CanvasStore`]; observers subscribe to whole
//!   snapshots
//! - Shaped fields expand into sub-fields, edited as `"<parent>.<sub>"`
//!
//! # Example
//!
//! ```
//! use metacanvas_canvas::{Canvas, CanvasConfig, StaticSchemaSource};
//! use metacanvas_domain::SchemaDocument;
//! use metacanvas_extractor::ExtractorConfig;
//! use metacanvas_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let config = CanvasConfig::default();
//! let core: SchemaDocument =
//!     serde_json::from_str(r#"{"fields": [{"id": "cclom:title"}]}"#).unwrap();
//! let schemas = StaticSchemaSource::new(&config).with_schema("core.json", core);
//! let llm = MockProvider::new(r#"{"cclom:title": "Workshop KI"}"#);
//!
//! let canvas = Canvas::new(Arc::new(llm), Arc::new(schemas), config, ExtractorConfig::default());
//! canvas.start_extraction("Workshop KI am 12. Mai").await.unwrap();
//!
//! assert_eq!(canvas.state().filled_fields, 1);
//! # });
//! ```

#![warn(missing_docs)]

pub mod canvas;
pub mod config;
pub mod content_type;
pub mod error;
pub mod grouping;
pub mod init;
pub mod normalizer;
pub mod schema;
pub mod serialize;
pub mod shape;
pub mod state;
pub mod store;

pub use canvas::Canvas;
pub use config::CanvasConfig;
pub use content_type::Detection;
pub use error::CanvasError;
pub use schema::{SchemaDirectory, StaticSchemaSource};
pub use state::{CanvasFieldState, CanvasState, FieldGroup};
pub use store::CanvasStore;
