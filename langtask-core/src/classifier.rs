//! Error classification.
//!
//! Turns raw [`ValidationFailure`]s and [`CompileFailure`]s into
//! [`ClassifiedError`]s whose messages name the exact field, state what was
//! expected and what was received, and suggest adjusting the upstream
//! instructions or schema.

use serde_json::{json, Value as JsonValue};

use crate::errors::{ClassifiedError, Constraints, ErrorCategory};
use crate::failure::{render_literals, value_kind, CompileFailure, Expected, ValidationFailure};
use crate::settings::{ValidationSettings, DEFAULT_PREVIEW_LIMIT};

/// Marker appended to truncated previews.
pub const ELLIPSIS: &str = "...";

/// Truncate text to `limit` characters, appending [`ELLIPSIS`] when cut.
#[must_use]
pub fn truncate_text(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}{}", &text[..idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Text form of a value for diagnostics.
///
/// Strings are truncated; other values are rendered in full.
#[must_use]
pub fn preview(value: &JsonValue, limit: usize) -> String {
    match value {
        JsonValue::String(s) => truncate_text(s, limit),
        other => other.to_string(),
    }
}

/// Whether text is a serialized object rather than structured data.
#[must_use]
pub fn looks_like_serialized_object(text: &str) -> bool {
    text.trim().starts_with('{')
}

/// Builds classified errors from raw failures.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    preview_limit: usize,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl ErrorClassifier {
    /// Create a classifier with the default preview limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier from validation settings.
    #[must_use]
    pub fn from_settings(settings: &ValidationSettings) -> Self {
        Self {
            preview_limit: settings.preview_limit,
        }
    }

    /// Classify the failures of one validation call.
    ///
    /// The message is phrased from the first failure; all of them are kept
    /// in the constraints bundle. `type_name` stands in for the field path
    /// when the failure concerns the whole record.
    #[must_use]
    pub fn classify(&self, type_name: &str, failures: Vec<ValidationFailure>) -> ClassifiedError {
        let Some(first) = failures.first() else {
            return ClassifiedError::new(
                ErrorCategory::StructureMismatch,
                type_name,
                format!(
                    "Schema validation failed for '{}' without further detail. \
                     Review the schema and adjust the upstream instructions.",
                    type_name
                ),
            );
        };

        let location = if first.path.is_empty() {
            type_name.to_string()
        } else {
            first.path.clone()
        };
        let input_preview = first
            .input
            .as_ref()
            .map(|v| preview(v, self.preview_limit))
            .unwrap_or_default();

        let mut message = self.message_for(first, &location, &input_preview);
        if failures.len() > 1 {
            message.push_str(&format!(
                " {} additional validation error(s) were found.",
                failures.len() - 1
            ));
        }

        let category = first.category;
        let mut constraints = Constraints::new(category)
            .with_expected(first.expected.clone())
            .with_preview(input_preview);
        if failures.len() > 1 {
            constraints = constraints.with_failures(failures);
        }

        ClassifiedError::new(category, location, message).with_constraints(constraints)
    }

    fn message_for(&self, failure: &ValidationFailure, location: &str, input_preview: &str) -> String {
        let received = failure.input.as_ref().map(value_kind).unwrap_or("nothing");

        match (&failure.category, &failure.expected) {
            (ErrorCategory::MissingField, _) => format!(
                "Required field '{}' is missing from the generated output. \
                 Adjust the upstream instructions so every required field is returned, \
                 or mark the field `required: false` in the schema.",
                location
            ),
            (ErrorCategory::TypeMismatch, expected) => format!(
                "Invalid type at '{}': expected {}, got {}. Value: '{}'. \
                 Adjust the upstream instructions to state the expected data type for this field.",
                location, expected, received, input_preview
            ),
            (ErrorCategory::OptionMismatch, Expected::OneOf { values }) => format!(
                "Invalid value at '{}': '{}' is not one of the allowed options {}. \
                 Adjust the upstream instructions to list the allowed values, \
                 or extend `options` in the schema.",
                location,
                input_preview,
                render_literals(values)
            ),
            (ErrorCategory::Range, expected) => format!(
                "Value at '{}' is out of range: expected {}, got {}. \
                 Adjust the upstream instructions to state the allowed range, \
                 or relax `minimum`/`maximum` in the schema.",
                location, expected, input_preview
            ),
            (ErrorCategory::Length, expected) => format!(
                "Length of '{}' is {}: expected {}. Received: '{}'. \
                 Adjust the upstream instructions to state the allowed length, \
                 or relax `min_length`/`max_length` in the schema.",
                location,
                failure.input.as_ref().map(measured_length).unwrap_or(0),
                expected,
                input_preview
            ),
            (ErrorCategory::Pattern, expected) => format!(
                "Value at '{}' does not match the required format: expected {}. Received: '{}'. \
                 Adjust the upstream instructions to describe the format, \
                 or relax `pattern` in the schema.",
                location, expected, input_preview
            ),
            (ErrorCategory::StructureMismatch, _) => match failure.input {
                Some(JsonValue::String(ref text)) if looks_like_serialized_object(text) => format!(
                    "Schema validation failed at '{}': the generation service returned serialized \
                     text (a string containing JSON) instead of structured data. Received: '{}'. \
                     Adjust the upstream instructions to explicitly request a structured response.",
                    location, input_preview
                ),
                _ => format!(
                    "Schema validation failed at '{}': expected structured data (an object), got {}. \
                     Received: '{}'. Adjust the upstream instructions/schema so this field is \
                     returned as a nested object.",
                    location, received, input_preview
                ),
            },
            (category, expected) => format!(
                "Schema validation failed at '{}': expected {}. Error type: {}. Received: '{}'. \
                 Review the schema and adjust the upstream instructions.",
                location, expected, category, input_preview
            ),
        }
    }

    /// Classify a schema compilation defect at `path`.
    ///
    /// `schema_name` stands in for the path when the defect concerns the
    /// whole definition.
    #[must_use]
    pub fn classify_compile(
        &self,
        schema_name: &str,
        path: &str,
        failure: CompileFailure,
    ) -> ClassifiedError {
        let field = if path.is_empty() { schema_name } else { path };
        let category = failure.category();
        let mut constraints = Constraints::new(category);

        let message = match failure {
            CompileFailure::NotAMapping { found } if path.is_empty() => {
                constraints = constraints.with_expected(Expected::Object);
                format!(
                    "Schema '{}' must be a mapping of field names to field definitions. Found: {}.",
                    schema_name, found
                )
            }
            CompileFailure::NotAMapping { found } => {
                constraints = constraints.with_expected(Expected::Object);
                format!(
                    "Field '{}' must be a mapping defining type and constraints. Found: {}.",
                    path, found
                )
            }
            CompileFailure::DuplicateField { normalized } => {
                constraints = constraints.with_detail("normalized_name", normalized.clone());
                format!(
                    "Field '{}' is declared more than once; field names are compared in lowercase ('{}').",
                    path, normalized
                )
            }
            CompileFailure::MissingType { allowed } => {
                constraints = constraints.with_detail("required_attribute", "type");
                format!(
                    "Field '{}' missing 'type'. Specify one of: {}.",
                    path,
                    allowed.join(", ")
                )
            }
            CompileFailure::InvalidType { found, allowed } => {
                let shown = preview(&found, self.preview_limit);
                constraints = constraints
                    .with_preview(shown.clone())
                    .with_detail("invalid_type", found)
                    .with_detail("allowed_types", json!(allowed));
                format!(
                    "Field '{}' has invalid type: {}. Specify one of: {}.",
                    path,
                    shown,
                    allowed.join(", ")
                )
            }
            CompileFailure::Options { reason, values } => {
                constraints = constraints.with_detail("values", values);
                format!("Field '{}' has an invalid options definition: {}.", path, reason)
            }
            CompileFailure::MissingProperties => {
                constraints = constraints.with_detail("required_attribute", "properties");
                format!(
                    "Object field '{}' must declare 'properties' describing its nested fields.",
                    path
                )
            }
            CompileFailure::DepthExceeded { depth, max } => {
                constraints = constraints
                    .with_detail("depth", depth)
                    .with_detail("max_depth", max);
                format!(
                    "Field '{}' exceeds the maximum nesting depth of {} object levels. \
                     Flatten the schema or move nested data into arrays.",
                    path, max
                )
            }
            CompileFailure::Constraint { keyword, reason } => {
                constraints = constraints.with_detail("keyword", keyword.clone());
                format!("Field '{}' has an invalid '{}' constraint: {}.", path, keyword, reason)
            }
        };

        ClassifiedError::new(category, field, message).with_constraints(constraints)
    }
}

fn measured_length(value: &JsonValue) -> usize {
    match value {
        JsonValue::String(s) => s.chars().count(),
        JsonValue::Array(items) => items.len(),
        _ => 0,
    }
}
