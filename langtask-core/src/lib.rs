//! # langtask-core
//!
//! Core error taxonomy, diagnostics and settings for langtask.
//!
//! This crate provides the types shared by the schema compiler and the
//! output validator:
//!
//! - **Errors**: [`ClassifiedError`], [`InfrastructureError`] and the
//!   [`ErrorCategory`] taxonomy
//! - **Failures**: raw [`ValidationFailure`] and [`CompileFailure`] records
//! - **Classifier**: [`ErrorClassifier`], which turns failures into
//!   actionable messages with safe input truncation
//! - **Settings**: [`ValidationSettings`]
//!
//! ## Example
//!
//! ```rust
//! use langtask_core::{ErrorCategory, ErrorClassifier, ValidationFailure};
//!
//! let err = ErrorClassifier::new().classify(
//!     "SentimentResponse",
//!     vec![ValidationFailure::missing("sentiment")],
//! );
//! assert_eq!(err.category, ErrorCategory::MissingField);
//! assert_eq!(err.field, "sentiment");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod classifier;
pub mod errors;
pub mod failure;
pub mod settings;

// Re-exports for convenience
pub use classifier::{looks_like_serialized_object, preview, truncate_text, ErrorClassifier, ELLIPSIS};
pub use errors::{ClassifiedError, Constraints, Error, ErrorCategory, InfrastructureError, Result};
pub use failure::{render_literals, value_kind, CompileFailure, Expected, ValidationFailure};
pub use settings::{ValidationSettings, DEFAULT_MAX_NESTING_DEPTH, DEFAULT_PREVIEW_LIMIT};
