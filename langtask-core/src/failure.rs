//! Raw failure records.
//!
//! The compiler and the validator describe what went wrong with these
//! types; the [classifier](crate::classifier) turns them into
//! [`ClassifiedError`](crate::ClassifiedError)s.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::errors::ErrorCategory;

/// The constraint a value was expected to satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expected {
    /// The field must be present.
    Present,
    /// A value of the named schema type.
    Type {
        /// Schema type name, e.g. `integer`.
        name: String,
    },
    /// One of an exact set of literals.
    OneOf {
        /// Allowed literals.
        values: Vec<JsonValue>,
    },
    /// A number within inclusive bounds.
    Range {
        /// Lower bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Upper bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// A text or sequence length within inclusive bounds.
    Length {
        /// Minimum length.
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        /// Maximum length.
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// Text matching a regular expression.
    Pattern {
        /// The pattern source.
        pattern: String,
    },
    /// Structured data (a mapping).
    Object,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("a value"),
            Self::Type { name } => f.write_str(name),
            Self::OneOf { values } => write!(f, "one of {}", render_literals(values)),
            Self::Range { minimum, maximum } => {
                f.write_str("a number ")?;
                write_bounds(f, minimum.as_ref(), maximum.as_ref())
            }
            Self::Length { min, max } => {
                f.write_str("a length ")?;
                write_bounds(f, min.as_ref(), max.as_ref())
            }
            Self::Pattern { pattern } => write!(f, "text matching `{}`", pattern),
            Self::Object => f.write_str("an object"),
        }
    }
}

fn write_bounds<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    min: Option<&T>,
    max: Option<&T>,
) -> fmt::Result {
    match (min, max) {
        (Some(min), Some(max)) => write!(f, "between {} and {}", min, max),
        (Some(min), None) => write!(f, "of at least {}", min),
        (None, Some(max)) => write!(f, "of at most {}", max),
        (None, None) => f.write_str("without bounds"),
    }
}

/// Render literals as `{a, b, c}`, strings without quotes.
#[must_use]
pub fn render_literals(values: &[JsonValue]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| match v {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    format!("{{{}}}", items.join(", "))
}

/// Name the JSON kind of a value for diagnostics.
#[must_use]
pub fn value_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "number",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// A single structural failure found while validating data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Dotted path of the field; empty for the root.
    pub path: String,
    /// Failure category.
    pub category: ErrorCategory,
    /// The constraint that did not hold.
    pub expected: Expected,
    /// The offending value, absent for missing fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<JsonValue>,
}

impl ValidationFailure {
    fn new(
        path: impl Into<String>,
        category: ErrorCategory,
        expected: Expected,
        input: Option<JsonValue>,
    ) -> Self {
        Self {
            path: path.into(),
            category,
            expected,
            input,
        }
    }

    /// A required field is absent.
    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(path, ErrorCategory::MissingField, Expected::Present, None)
    }

    /// A value has the wrong type.
    pub fn type_mismatch(
        path: impl Into<String>,
        expected_type: impl Into<String>,
        input: JsonValue,
    ) -> Self {
        Self::new(
            path,
            ErrorCategory::TypeMismatch,
            Expected::Type {
                name: expected_type.into(),
            },
            Some(input),
        )
    }

    /// A value is not one of the allowed literals.
    pub fn option_mismatch(path: impl Into<String>, allowed: Vec<JsonValue>, input: JsonValue) -> Self {
        Self::new(
            path,
            ErrorCategory::OptionMismatch,
            Expected::OneOf { values: allowed },
            Some(input),
        )
    }

    /// A number is outside its bounds.
    pub fn out_of_range(
        path: impl Into<String>,
        minimum: Option<f64>,
        maximum: Option<f64>,
        input: JsonValue,
    ) -> Self {
        Self::new(
            path,
            ErrorCategory::Range,
            Expected::Range { minimum, maximum },
            Some(input),
        )
    }

    /// A text or sequence length is outside its bounds.
    pub fn length(
        path: impl Into<String>,
        min: Option<usize>,
        max: Option<usize>,
        input: JsonValue,
    ) -> Self {
        Self::new(path, ErrorCategory::Length, Expected::Length { min, max }, Some(input))
    }

    /// Text does not match a pattern.
    pub fn pattern(path: impl Into<String>, pattern: impl Into<String>, input: JsonValue) -> Self {
        Self::new(
            path,
            ErrorCategory::Pattern,
            Expected::Pattern {
                pattern: pattern.into(),
            },
            Some(input),
        )
    }

    /// Structured data was expected, something else was received.
    pub fn structure_mismatch(path: impl Into<String>, input: JsonValue) -> Self {
        Self::new(path, ErrorCategory::StructureMismatch, Expected::Object, Some(input))
    }
}

/// A defect found while compiling a schema definition.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileFailure {
    /// The definition or a field spec is not a mapping.
    NotAMapping {
        /// Kind of value found instead.
        found: String,
    },
    /// Two field names collide once lowercased.
    DuplicateField {
        /// The normalized name.
        normalized: String,
    },
    /// The field spec has no `type`.
    MissingType {
        /// Accepted type names.
        allowed: Vec<String>,
    },
    /// The `type` is not a known type name.
    InvalidType {
        /// The declared value.
        found: JsonValue,
        /// Accepted type names.
        allowed: Vec<String>,
    },
    /// The `options` declaration is unusable.
    Options {
        /// What is wrong.
        reason: String,
        /// The declared options.
        values: JsonValue,
    },
    /// An object field has no `properties`.
    MissingProperties,
    /// Descending would exceed the nesting limit.
    DepthExceeded {
        /// Depth the field's properties would live at.
        depth: usize,
        /// Configured limit.
        max: usize,
    },
    /// A bound, length or pattern declaration is unusable.
    Constraint {
        /// The offending key.
        keyword: String,
        /// What is wrong.
        reason: String,
    },
}

impl CompileFailure {
    /// The category this failure maps to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotAMapping { .. } | Self::DuplicateField { .. } => ErrorCategory::Structure,
            Self::MissingType { .. } => ErrorCategory::MissingType,
            Self::InvalidType { .. } => ErrorCategory::InvalidType,
            Self::Options { .. } => ErrorCategory::Options,
            Self::MissingProperties => ErrorCategory::ObjectProperties,
            Self::DepthExceeded { .. } => ErrorCategory::NestingDepth,
            Self::Constraint { .. } => ErrorCategory::Constraint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_literals() {
        let values = vec![json!("positive"), json!("negative"), json!(3)];
        assert_eq!(render_literals(&values), "{positive, negative, 3}");
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind(&json!(1)), "integer");
        assert_eq!(value_kind(&json!(1.5)), "number");
        assert_eq!(value_kind(&json!("x")), "string");
        assert_eq!(value_kind(&json!({})), "object");
        assert_eq!(value_kind(&JsonValue::Null), "null");
    }

    #[test]
    fn test_expected_display() {
        let range = Expected::Range {
            minimum: Some(0.0),
            maximum: Some(1.0),
        };
        assert_eq!(range.to_string(), "a number between 0 and 1");

        let length = Expected::Length {
            min: None,
            max: Some(5),
        };
        assert_eq!(length.to_string(), "a length of at most 5");
    }

    #[test]
    fn test_failure_constructors() {
        let f = ValidationFailure::missing("sentiment");
        assert_eq!(f.category, ErrorCategory::MissingField);
        assert!(f.input.is_none());

        let f = ValidationFailure::option_mismatch("sentiment", vec![json!("a")], json!("b"));
        assert_eq!(f.category, ErrorCategory::OptionMismatch);
        assert_eq!(f.input, Some(json!("b")));
    }

    #[test]
    fn test_compile_failure_category() {
        assert_eq!(
            CompileFailure::MissingProperties.category(),
            ErrorCategory::ObjectProperties
        );
        assert_eq!(
            CompileFailure::DuplicateField {
                normalized: "name".into()
            }
            .category(),
            ErrorCategory::Structure
        );
    }
}
