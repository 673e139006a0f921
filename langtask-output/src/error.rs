//! Error types reported by provider adapters.

use langtask_core::ClassifiedError;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Failure reported by a [`ProviderAdapter`](crate::ProviderAdapter).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdapterError {
    /// The adapter could not coerce its response into any data shape.
    #[error("Failed to parse generated output: {message}")]
    Parse {
        /// What went wrong.
        message: String,
        /// The unparsable response text.
        raw: Option<String>,
    },

    /// The adapter validated the output itself and it failed.
    #[error(transparent)]
    Validation(#[from] ClassifiedError),

    /// Any other failure, e.g. communication with the service.
    #[error("Generation failed: {message}")]
    Failed {
        /// What went wrong.
        message: String,
        /// The raw response payload, when one was received.
        response: Option<JsonValue>,
    },
}

impl AdapterError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            raw: None,
        }
    }

    /// Create a parse error carrying the unparsable text.
    pub fn parse_with_raw(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            raw: Some(raw.into()),
        }
    }

    /// Create a generic failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            response: None,
        }
    }

    /// Create a generic failure carrying the raw response.
    pub fn failed_with_response(message: impl Into<String>, response: JsonValue) -> Self {
        Self::Failed {
            message: message.into(),
            response: Some(response),
        }
    }

    /// Whether the adapter failed to parse its own response.
    #[must_use]
    pub fn is_parsing_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}
