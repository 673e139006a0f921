//! # langtask-output
//!
//! Output validation for langtask.
//!
//! This crate checks untrusted structured data produced by a text-generation
//! service against a [`CompiledType`](langtask_schema::CompiledType) and
//! returns either an immutable
//! [`StructuredResponse`](langtask_schema::StructuredResponse) or a
//! classified diagnostic.
//!
//! ## Core Concepts
//!
//! - **[`RawOutput`]**: plain data, a provider [`Generation`] wrapper, or an
//!   existing response
//! - **[`OutputValidator`]**: builds the response, collecting every failure
//! - **[`ProviderAdapter`]**: the boundary to the generation service
//! - **[`handle_generation_result`]**: invokes an adapter and sorts its
//!   outcome into validation, parsing or infrastructure errors
//!
//! ## Example
//!
//! ```rust
//! use langtask_output::validate;
//! use langtask_schema::compile;
//! use serde_json::json;
//!
//! let compiled = compile(
//!     Some(&json!({
//!         "sentiment": {"type": "string", "options": ["positive", "negative", "neutral"]},
//!         "confidence": {"type": "number"},
//!     })),
//!     "sentiment.yaml",
//! )
//! .unwrap()
//! .unwrap();
//!
//! let response = validate(json!({"sentiment": "positive", "confidence": 0.95}), &compiled).unwrap();
//! assert_eq!(response.get("sentiment").unwrap().as_str(), Some("positive"));
//!
//! let err = validate(json!({"confidence": 0.95}), &compiled).unwrap_err();
//! assert_eq!(err.field, "sentiment");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod handler;
pub mod provider;
pub mod raw;
pub mod validator;

// Re-exports
pub use error::AdapterError;
pub use handler::handle_generation_result;
pub use provider::{BoxedAdapter, ProviderAdapter, SyncAdapter};
pub use raw::{Generation, RawOutput};
pub use validator::{validate, OutputValidator};
