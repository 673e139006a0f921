//! # langtask-schema
//!
//! Schema compilation and caching for langtask.
//!
//! A schema definition is an ordered mapping from field name to field spec
//! (`type`, `options`, `properties`, `required`, `default`, bounds and
//! metadata). This crate turns it into a [`CompiledType`] tree and keeps
//! compiled types in a compile-once [`SchemaCache`].
//!
//! ## Example
//!
//! ```rust
//! use langtask_schema::{compile, FieldKind};
//! use serde_json::json;
//!
//! let definition = json!({
//!     "sentiment": {"type": "string", "options": ["positive", "negative", "neutral"]},
//!     "confidence": {"type": "number", "required": false, "default": 0.0},
//! });
//!
//! let compiled = compile(Some(&definition), "schemas/sentiment_schema.yaml")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(compiled.name(), "SentimentSchemaResponse");
//! assert!(matches!(compiled.field("sentiment").unwrap().kind, FieldKind::ClosedSet(_)));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod cache;
pub mod compiled;
pub mod compiler;
pub mod error;
pub mod loader;
pub mod mapper;
pub mod response;

// Re-exports for convenience
pub use cache::{global_cache, load_schema, SchemaCache};
pub use compiled::{
    ClosedSet, CompiledField, CompiledType, FieldConstraints, FieldKind, FieldPattern, Literal,
};
pub use compiler::{compile, type_name, SchemaCompiler};
pub use error::{SchemaError, SchemaResult};
pub use loader::{DefinitionLoader, SchemaIdentity, YamlFileLoader};
pub use mapper::{SchemaType, ValueType};
pub use response::{FieldValue, StructuredResponse};
