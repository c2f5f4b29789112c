//! Metacanvas Domain Layer
//!
//! This crate contains the core vocabulary of Metacanvas: what a metadata
//! field is, which values it may hold, and the trait interfaces the other
//! layers implement.
//!
//! ## Key Concepts
//!
//! - **Field**: One schema-defined metadata slot, filled by extraction or by hand
//! - **Vocabulary**: A constrained value space (closed, SKOS, or open)
//! - **Shape**: Nested sub-fields describing a composite value
//! - **Status**: Lifecycle of a field (empty → extracting → filled | error)
//!
//! ## Architecture
//!
//! - Field values are plain `serde_json::Value`s
//! - No I/O; infrastructure implementations live in other crates
//! - Trait definitions for the LLM gateway and the schema model

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field;
pub mod message;
pub mod schema;
pub mod status;
pub mod traits;
pub mod vocabulary;

// Re-exports for convenience
pub use field::{Datatype, FieldDefinition, ValidationRules};
pub use message::{ChatMessage, Role};
pub use schema::{SchemaDocument, SchemaError, SchemaField, SchemaGroup};
pub use status::{is_value_filled, FieldStatus};
pub use vocabulary::{Concept, Vocabulary, VocabularyType};
