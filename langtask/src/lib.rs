//! # langtask - Schema-Checked Structured Output for Rust
//!
//! langtask compiles declarative schema definitions into runtime-checked
//! types and validates untrusted structured data produced by a
//! text-generation service against them. Every call returns either an
//! immutable [`StructuredResponse`] or a [`ClassifiedError`] that names the
//! offending field, states what was expected, and suggests a fix.
//!
//! ## Quick Start
//!
//! ```rust
//! use langtask::prelude::*;
//! use serde_json::json;
//!
//! let definition = json!({
//!     "sentiment": {"type": "string", "options": ["positive", "negative", "neutral"]},
//!     "confidence": {"type": "number", "required": false, "default": 0.0},
//! });
//! let compiled = compile(Some(&definition), "schemas/sentiment_schema.yaml")
//!     .unwrap()
//!     .unwrap();
//!
//! let response = validate(json!({"sentiment": "positive"}), &compiled).unwrap();
//! assert_eq!(response.get("sentiment").unwrap().as_str(), Some("positive"));
//! assert_eq!(response.get("confidence").unwrap().as_f64(), Some(0.0));
//!
//! let err = validate(json!({"sentiment": "angry"}), &compiled).unwrap_err();
//! assert_eq!(err.category, ErrorCategory::OptionMismatch);
//! ```
//!
//! ## Architecture
//!
//! langtask is organized as a workspace of focused crates:
//!
//! - [`langtask_core`] - Error taxonomy, classifier and settings
//! - [`langtask_schema`] - Type mapper, schema compiler, compiled types and cache
//! - [`langtask_output`] - Output validator and provider adapter boundary
//!
//! ## Schema Files
//!
//! ```yaml
//! sentiment: {type: string, options: [positive, negative, neutral]}
//! confidence: {type: number, required: false, default: 0.0}
//! metadata: {type: object, required: false, properties: {source: {type: string}}}
//! ```
//!
//! [`load_schema`] reads a file like this through the process-wide
//! [`SchemaCache`], compiling it once per normalized path.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Crate Re-exports
// ============================================================================

pub use langtask_core as core;
pub use langtask_output as output;
pub use langtask_schema as schema;

// ============================================================================
// Type Re-exports
// ============================================================================

// Core
pub use langtask_core::{
    ClassifiedError, Constraints, Error, ErrorCategory, ErrorClassifier, Expected,
    InfrastructureError, Result, ValidationFailure, ValidationSettings,
};

// Schema
pub use langtask_schema::{
    compile, global_cache, load_schema, CompiledField, CompiledType, DefinitionLoader, FieldKind,
    FieldValue, SchemaCache, SchemaCompiler, SchemaError, SchemaIdentity, SchemaType,
    StructuredResponse, YamlFileLoader,
};

// Output
pub use langtask_output::{
    handle_generation_result, validate, AdapterError, BoxedAdapter, Generation, OutputValidator,
    ProviderAdapter, RawOutput, SyncAdapter,
};

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient prelude for common imports.
///
/// ```rust
/// use langtask::prelude::*;
/// ```
pub mod prelude {
    // Errors
    pub use crate::core::{ClassifiedError, Error, ErrorCategory, InfrastructureError, Result};

    // Settings
    pub use crate::core::ValidationSettings;

    // Schemas
    pub use crate::schema::{
        compile, load_schema, CompiledType, FieldValue, SchemaCache, SchemaCompiler, SchemaError,
        SchemaIdentity, StructuredResponse, YamlFileLoader,
    };

    // Output
    pub use crate::output::{
        handle_generation_result, validate, AdapterError, Generation, OutputValidator,
        ProviderAdapter, RawOutput,
    };
}

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of langtask.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
