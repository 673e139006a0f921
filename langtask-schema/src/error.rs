//! Error types for schema loading and compilation.

use langtask_core::{ClassifiedError, ErrorCategory};
use thiserror::Error;

/// Error while obtaining a compiled type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// The definition violates the schema grammar.
    #[error(transparent)]
    Invalid(#[from] ClassifiedError),

    /// The definition could not be read or parsed.
    #[error("Failed to load schema '{identity}': {message}")]
    Load {
        /// Identity of the schema.
        identity: String,
        /// What went wrong.
        message: String,
    },
}

impl SchemaError {
    /// Create a load error.
    pub fn load(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            identity: identity.into(),
            message: message.into(),
        }
    }

    /// The classification of an invalid definition.
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Invalid(e) => Some(e.category),
            Self::Load { .. } => None,
        }
    }
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
