//! Error types for langtask.
//!
//! Every failure surfaced by the schema compiler, the output validator or
//! the generation boundary is described by an [`ErrorCategory`] and carries
//! a [`Constraints`] bundle so callers can react programmatically instead of
//! parsing messages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use thiserror::Error;

use crate::failure::{Expected, ValidationFailure};

/// The main error type for langtask operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Schema or output validation failure.
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    /// Provider communication or unclassified failure.
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl Error {
    /// The category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Classified(e) => e.category,
            Self::Infrastructure(_) => ErrorCategory::Infrastructure,
        }
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Classified(e) => &e.message,
            Self::Infrastructure(e) => &e.message,
        }
    }

    /// The classified error, if this is one.
    #[must_use]
    pub fn as_classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Classified(e) => Some(e),
            Self::Infrastructure(_) => None,
        }
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Definition or field spec is not a valid mapping.
    Structure,
    /// Field spec lacks `type`.
    MissingType,
    /// `type` is not in the fixed enumeration.
    InvalidType,
    /// `options` invalid, mismatched, or on an unsupported type.
    Options,
    /// Object field missing `properties`.
    ObjectProperties,
    /// Object nesting exceeds the configured depth.
    NestingDepth,
    /// A declared bound, length or pattern is malformed.
    Constraint,
    /// Required field absent from the data.
    MissingField,
    /// Value type disagrees with the declared type.
    TypeMismatch,
    /// Value not among the closed literal set.
    OptionMismatch,
    /// Numeric bound violated.
    Range,
    /// Length bound violated.
    Length,
    /// Pattern not matched.
    Pattern,
    /// Object expected, scalar or text received.
    StructureMismatch,
    /// The provider adapter could not turn its response into data.
    Parse,
    /// Provider communication or unclassified failure.
    Infrastructure,
}

impl ErrorCategory {
    /// The canonical tag name, e.g. `MissingFieldError`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Structure => "StructureError",
            Self::MissingType => "MissingTypeError",
            Self::InvalidType => "InvalidTypeError",
            Self::Options => "OptionsError",
            Self::ObjectProperties => "ObjectPropertiesError",
            Self::NestingDepth => "NestingDepthError",
            Self::Constraint => "ConstraintError",
            Self::MissingField => "MissingFieldError",
            Self::TypeMismatch => "TypeMismatchError",
            Self::OptionMismatch => "OptionMismatchError",
            Self::Range => "RangeError",
            Self::Length => "LengthError",
            Self::Pattern => "PatternError",
            Self::StructureMismatch => "StructureMismatchError",
            Self::Parse => "ParseError",
            Self::Infrastructure => "InfrastructureError",
        }
    }

    /// Whether the compiler raises this category.
    #[must_use]
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            Self::Structure
                | Self::MissingType
                | Self::InvalidType
                | Self::Options
                | Self::ObjectProperties
                | Self::NestingDepth
                | Self::Constraint
        )
    }

    /// Whether re-prompting the generation service may fix this failure.
    ///
    /// The core never retries; this is a hint for callers.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MissingField
                | Self::TypeMismatch
                | Self::OptionMismatch
                | Self::Range
                | Self::Length
                | Self::Pattern
                | Self::StructureMismatch
                | Self::Parse
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Machine-readable details attached to a [`ClassifiedError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Failure category.
    pub category: ErrorCategory,
    /// The constraint that was expected to hold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,
    /// Every underlying failure, when validation produced several.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ValidationFailure>,
    /// Truncated text form of the offending value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_preview: Option<String>,
    /// Additional category-specific details.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, JsonValue>,
}

impl Constraints {
    /// Create an empty bundle for a category.
    #[must_use]
    pub fn new(category: ErrorCategory) -> Self {
        Self {
            category,
            expected: None,
            failures: Vec::new(),
            input_preview: None,
            details: Map::new(),
        }
    }

    /// Set the expected constraint.
    #[must_use]
    pub fn with_expected(mut self, expected: Expected) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Set the underlying failures.
    #[must_use]
    pub fn with_failures(mut self, failures: Vec<ValidationFailure>) -> Self {
        self.failures = failures;
        self
    }

    /// Set the input preview.
    #[must_use]
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.input_preview = Some(preview.into());
        self
    }

    /// Add a detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// A categorized, human-readable validation or compilation failure.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ClassifiedError {
    /// Actionable message naming the field, the expectation and a fix.
    pub message: String,
    /// Dotted path of lowercase field names, or the type/schema name when no
    /// field applies.
    pub field: String,
    /// Failure category.
    pub category: ErrorCategory,
    /// Machine-readable details.
    pub constraints: Constraints,
}

impl ClassifiedError {
    /// Create a new classified error with an empty constraints bundle.
    pub fn new(
        category: ErrorCategory,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
            category,
            constraints: Constraints::new(category),
        }
    }

    /// Replace the constraints bundle.
    ///
    /// The bundle's category is forced to match the error's.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self.constraints.category = self.category;
        self
    }

    /// The expected constraint, if any.
    #[must_use]
    pub fn expected(&self) -> Option<&Expected> {
        self.constraints.expected.as_ref()
    }

    /// The truncated preview of the offending value, if any.
    #[must_use]
    pub fn input_preview(&self) -> Option<&str> {
        self.constraints.input_preview.as_deref()
    }
}

/// Failure outside schema or data validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct InfrastructureError {
    /// Error message.
    pub message: String,
    /// Identity of the provider adapter that failed.
    pub provider: String,
    /// Raw response payload, when the adapter exposed one.
    pub response: Option<JsonValue>,
    /// Text of the underlying cause.
    pub cause: Option<String>,
}

impl fmt::Display for InfrastructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (provider: {})", self.message, self.provider)?;
        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl InfrastructureError {
    /// Create a new infrastructure error.
    pub fn new(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider: provider.into(),
            response: None,
            cause: None,
        }
    }

    /// Attach the raw response payload.
    #[must_use]
    pub fn with_response(mut self, response: Option<JsonValue>) -> Self {
        self.response = response;
        self
    }

    /// Set the cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(ErrorCategory::MissingField.name(), "MissingFieldError");
        assert_eq!(ErrorCategory::NestingDepth.to_string(), "NestingDepthError");
        assert_eq!(
            serde_json::to_value(ErrorCategory::StructureMismatch).unwrap(),
            serde_json::json!("structure_mismatch")
        );
    }

    #[test]
    fn test_category_groups() {
        assert!(ErrorCategory::ObjectProperties.is_compile_time());
        assert!(!ErrorCategory::ObjectProperties.is_retryable());
        assert!(ErrorCategory::OptionMismatch.is_retryable());
        assert!(!ErrorCategory::Infrastructure.is_retryable());
        assert!(!ErrorCategory::Infrastructure.is_compile_time());
    }

    #[test]
    fn test_classified_error_display() {
        let err = ClassifiedError::new(ErrorCategory::MissingType, "name", "Field 'name' missing 'type'");
        assert_eq!(err.to_string(), "Field 'name' missing 'type'");
        assert_eq!(err.constraints.category, ErrorCategory::MissingType);
    }

    #[test]
    fn test_with_constraints_keeps_category() {
        let err = ClassifiedError::new(ErrorCategory::Range, "score", "out of range")
            .with_constraints(Constraints::new(ErrorCategory::Structure).with_preview("12"));
        assert_eq!(err.constraints.category, ErrorCategory::Range);
        assert_eq!(err.input_preview(), Some("12"));
    }

    #[test]
    fn test_infrastructure_error() {
        let err = InfrastructureError::new("Failed to process structured output", "mock")
            .with_cause("connection reset");
        let top: Error = err.into();
        assert_eq!(top.category(), ErrorCategory::Infrastructure);
        assert!(top.to_string().contains("mock"));
        assert!(top.to_string().contains("connection reset"));
        assert!(top.as_classified().is_none());
    }
}
