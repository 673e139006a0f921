//! Output validation.
//!
//! [`OutputValidator`] walks a [`CompiledType`] against raw data and either
//! builds an immutable [`StructuredResponse`] or classifies every failure
//! it found into a single [`ClassifiedError`].

use indexmap::IndexMap;
use langtask_core::{ClassifiedError, ErrorClassifier, ValidationFailure, ValidationSettings};
use langtask_schema::{
    CompiledField, CompiledType, FieldConstraints, FieldKind, FieldValue, StructuredResponse,
    ValueType,
};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, error};

use crate::raw::RawOutput;

/// Validates raw output against compiled types.
#[derive(Debug, Clone, Default)]
pub struct OutputValidator {
    settings: ValidationSettings,
    classifier: ErrorClassifier,
}

impl OutputValidator {
    /// Create a validator with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom settings.
    #[must_use]
    pub fn with_settings(settings: ValidationSettings) -> Self {
        Self {
            classifier: ErrorClassifier::from_settings(&settings),
            settings,
        }
    }

    /// Get the settings.
    #[must_use]
    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// Validate raw output against `compiled`.
    ///
    /// A response already built from `compiled` is returned unchanged; a
    /// response of another type is re-validated from its data. Provider
    /// wrappers are unwrapped to their payload first.
    pub fn validate(
        &self,
        raw: impl Into<RawOutput>,
        compiled: &Arc<CompiledType>,
    ) -> Result<StructuredResponse, ClassifiedError> {
        let data = match raw.into() {
            RawOutput::Response(response) if response.is_instance_of(compiled) => {
                debug!(type_name = compiled.name(), "Output already validated");
                return Ok(response);
            }
            RawOutput::Response(response) => response.to_json(),
            RawOutput::Generation(generation) => generation.into_payload(),
            RawOutput::Data(data) => data,
        };

        let mut failures = Vec::new();
        match self.build_record(compiled, &data, "", &mut failures) {
            Some(response) if failures.is_empty() => {
                debug!(
                    type_name = compiled.name(),
                    field_count = response.len(),
                    "Output validated"
                );
                Ok(response)
            }
            _ => {
                let failure_count = failures.len();
                let err = self.classifier.classify(compiled.name(), failures);
                error!(
                    type_name = compiled.name(),
                    field = %err.field,
                    category = %err.category,
                    input_preview = err.input_preview().unwrap_or_default(),
                    failure_count,
                    "Output validation failed"
                );
                Err(err)
            }
        }
    }

    fn build_record(
        &self,
        compiled: &Arc<CompiledType>,
        data: &JsonValue,
        path: &str,
        failures: &mut Vec<ValidationFailure>,
    ) -> Option<StructuredResponse> {
        let Some(map) = data.as_object() else {
            failures.push(ValidationFailure::structure_mismatch(path, data.clone()));
            return None;
        };

        let before = failures.len();
        let mut values = IndexMap::with_capacity(compiled.len());

        for field in compiled.fields() {
            let field_path = join_path(path, &field.name);
            let value = match self.lookup(map, &field.name) {
                Some(value) if !value.is_null() => {
                    match self.field_value(field, value, &field_path, failures) {
                        Some(value) => value,
                        None => continue,
                    }
                }
                present => match field.resolved_default() {
                    Some(default) => default,
                    None => {
                        failures.push(match present {
                            Some(null) => ValidationFailure::type_mismatch(
                                field_path,
                                field.schema_type().as_str(),
                                null.clone(),
                            ),
                            None => ValidationFailure::missing(field_path),
                        });
                        continue;
                    }
                },
            };
            values.insert(field.name.clone(), value);
        }

        self.log_extra_keys(compiled, map, path);

        if failures.len() > before {
            return None;
        }
        let response = StructuredResponse::try_new(Arc::clone(compiled), values);
        if response.is_none() {
            failures.push(ValidationFailure::structure_mismatch(path, data.clone()));
        }
        response
    }

    fn field_value(
        &self,
        field: &CompiledField,
        value: &JsonValue,
        path: &str,
        failures: &mut Vec<ValidationFailure>,
    ) -> Option<FieldValue> {
        let normalized = match &field.kind {
            FieldKind::Object(nested) => {
                return self
                    .build_record(nested, value, path, failures)
                    .map(FieldValue::Record);
            }
            FieldKind::ClosedSet(set) => match set.find(value) {
                Some(literal) => literal.to_json(),
                None => {
                    failures.push(ValidationFailure::option_mismatch(
                        path,
                        set.values(),
                        value.clone(),
                    ));
                    return None;
                }
            },
            FieldKind::Scalar(value_type) => self.normalize(*value_type, value, path, failures)?,
            FieldKind::Array => self.normalize(ValueType::Sequence, value, path, failures)?,
        };

        check_constraints(&field.constraints, &normalized, path, failures)
            .then_some(FieldValue::Value(normalized))
    }

    fn normalize(
        &self,
        value_type: ValueType,
        value: &JsonValue,
        path: &str,
        failures: &mut Vec<ValidationFailure>,
    ) -> Option<JsonValue> {
        let normalized = value_type.normalize(value);
        if normalized.is_none() {
            failures.push(ValidationFailure::type_mismatch(
                path,
                value_type.schema_type().as_str(),
                value.clone(),
            ));
        }
        normalized
    }

    fn lookup<'a>(&self, map: &'a Map<String, JsonValue>, name: &str) -> Option<&'a JsonValue> {
        map.get(name).or_else(|| {
            if self.settings.case_insensitive_keys {
                map.iter()
                    .find(|(key, _)| key.to_lowercase() == name)
                    .map(|(_, value)| value)
            } else {
                None
            }
        })
    }

    fn log_extra_keys(&self, compiled: &CompiledType, map: &Map<String, JsonValue>, path: &str) {
        let extras: Vec<&str> = map
            .keys()
            .filter(|key| {
                compiled.field(key).is_none()
                    && !(self.settings.case_insensitive_keys
                        && compiled.field(&key.to_lowercase()).is_some())
            })
            .map(String::as_str)
            .collect();
        if !extras.is_empty() {
            debug!(
                type_name = compiled.name(),
                path,
                extra_fields = ?extras,
                "Ignoring undeclared fields"
            );
        }
    }
}

/// Validate raw output with default settings.
pub fn validate(
    raw: impl Into<RawOutput>,
    compiled: &Arc<CompiledType>,
) -> Result<StructuredResponse, ClassifiedError> {
    OutputValidator::new().validate(raw, compiled)
}

fn check_constraints(
    constraints: &FieldConstraints,
    value: &JsonValue,
    path: &str,
    failures: &mut Vec<ValidationFailure>,
) -> bool {
    if constraints.is_empty() {
        return true;
    }
    let before = failures.len();

    if let Some(n) = value.as_f64() {
        let below = constraints.minimum.is_some_and(|min| n < min);
        let above = constraints.maximum.is_some_and(|max| n > max);
        if below || above {
            failures.push(ValidationFailure::out_of_range(
                path,
                constraints.minimum,
                constraints.maximum,
                value.clone(),
            ));
        }
    }

    let length = match value {
        JsonValue::String(s) => Some(s.chars().count()),
        JsonValue::Array(items) => Some(items.len()),
        _ => None,
    };
    if let Some(len) = length {
        let short = constraints.min_length.is_some_and(|min| len < min);
        let long = constraints.max_length.is_some_and(|max| len > max);
        if short || long {
            failures.push(ValidationFailure::length(
                path,
                constraints.min_length,
                constraints.max_length,
                value.clone(),
            ));
        }
    }

    if let (Some(pattern), Some(text)) = (&constraints.pattern, value.as_str()) {
        if !pattern.is_match(text) {
            failures.push(ValidationFailure::pattern(path, pattern.as_str(), value.clone()));
        }
    }

    failures.len() == before
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Generation;
    use langtask_core::{ErrorCategory, Expected, ELLIPSIS};
    use langtask_schema::compile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn schema(definition: JsonValue) -> Arc<CompiledType> {
        compile(Some(&definition), "/schemas/sentiment.yaml")
            .unwrap()
            .unwrap()
    }

    fn sentiment() -> Arc<CompiledType> {
        schema(json!({
            "sentiment": {"type": "string", "options": ["positive", "negative", "neutral"]},
            "confidence": {"type": "number"}
        }))
    }

    #[test]
    fn test_valid_output() {
        let response = validate(json!({"sentiment": "positive", "confidence": 0.95}), &sentiment()).unwrap();
        assert_eq!(response.get("sentiment").unwrap(), &"positive");
        assert_eq!(response.get("confidence").unwrap().as_f64(), Some(0.95));
        assert_eq!(response.type_name(), "SentimentResponse");
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate(json!({"confidence": 0.95}), &sentiment()).unwrap_err();
        assert_eq!(err.category, ErrorCategory::MissingField);
        assert_eq!(err.field, "sentiment");
    }

    #[test]
    fn test_option_mismatch() {
        let err = validate(json!({"sentiment": "angry", "confidence": 0.5}), &sentiment()).unwrap_err();
        assert_eq!(err.category, ErrorCategory::OptionMismatch);
        assert_eq!(err.field, "sentiment");
        assert!(err.message.contains("{positive, negative, neutral}"));
        assert_eq!(
            err.expected(),
            Some(&Expected::OneOf {
                values: vec![json!("positive"), json!("negative"), json!("neutral")]
            })
        );
    }

    #[test]
    fn test_closed_set_is_exact() {
        let err = validate(json!({"sentiment": "Positive", "confidence": 0.5}), &sentiment()).unwrap_err();
        assert_eq!(err.category, ErrorCategory::OptionMismatch);
    }

    #[test]
    fn test_optional_field_absent() {
        let compiled = schema(json!({
            "summary": {"type": "string"},
            "note": {"type": "string", "required": false},
            "score": {"type": "number", "required": false, "default": 0.0}
        }));

        let response = validate(json!({"summary": "ok"}), &compiled).unwrap();
        assert!(response.get("note").unwrap().is_absent());
        assert_eq!(response.get("score").unwrap().as_f64(), Some(0.0));

        let response = validate(json!({"summary": "ok", "note": null}), &compiled).unwrap();
        assert!(response.get("note").unwrap().is_absent());
    }

    #[test]
    fn test_null_required_field() {
        let err = validate(json!({"sentiment": null, "confidence": 0.5}), &sentiment()).unwrap_err();
        assert_eq!(err.category, ErrorCategory::TypeMismatch);
        assert_eq!(err.field, "sentiment");
    }

    #[test]
    fn test_serialized_text_for_object() {
        let compiled = schema(json!({
            "metadata": {"type": "object", "properties": {"sentiment": {"type": "string"}}}
        }));
        let err = validate(json!({"metadata": "{\"sentiment\": \"positive\"}"}), &compiled).unwrap_err();
        assert_eq!(err.category, ErrorCategory::StructureMismatch);
        assert_eq!(err.field, "metadata");
        assert!(err.message.contains("serialized"));
        assert!(err.message.contains("instead of structured data"));

        let err = validate(json!({"metadata": "positive"}), &compiled).unwrap_err();
        assert_eq!(err.category, ErrorCategory::StructureMismatch);
        assert!(!err.message.contains("serialized"));
    }

    #[test]
    fn test_generation_text_at_root() {
        let err = validate(Generation::new("{\"sentiment\": \"positive\"}"), &sentiment()).unwrap_err();
        assert_eq!(err.category, ErrorCategory::StructureMismatch);
        assert_eq!(err.field, "SentimentResponse");
        assert!(err.message.contains("serialized"));
    }

    #[test]
    fn test_generation_data_is_unwrapped() {
        let generation = Generation::new("ignored").with_data(json!({"sentiment": "neutral", "confidence": 1}));
        let response = validate(generation, &sentiment()).unwrap();
        assert_eq!(response.get("sentiment").unwrap(), &"neutral");
    }

    #[rstest]
    #[case(100, false)]
    #[case(101, true)]
    fn test_preview_truncation(#[case] len: usize, #[case] truncated: bool) {
        let compiled = schema(json!({"count": {"type": "integer"}}));
        let text = "a".repeat(len);
        let err = validate(json!({"count": text.clone()}), &compiled).unwrap_err();

        let expected = if truncated {
            format!("{}{}", "a".repeat(100), ELLIPSIS)
        } else {
            text
        };
        assert_eq!(err.input_preview(), Some(expected.as_str()));
        assert!(err.message.contains(&format!("'{}'", expected)));
    }

    #[test]
    fn test_idempotent_for_same_type() {
        let compiled = sentiment();
        let response = validate(json!({"sentiment": "positive", "confidence": 0.9}), &compiled).unwrap();
        let again = validate(response.clone(), &compiled).unwrap();
        assert_eq!(again, response);
    }

    #[test]
    fn test_other_type_is_revalidated() {
        let other = schema(json!({"confidence": {"type": "number"}}));
        let response = validate(json!({"confidence": 0.9}), &other).unwrap();
        let err = validate(response, &sentiment()).unwrap_err();
        assert_eq!(err.category, ErrorCategory::MissingField);
    }

    #[test]
    fn test_nested_records() {
        let compiled = schema(json!({
            "metadata": {
                "type": "object",
                "properties": {
                    "source": {"type": "string"},
                    "details": {"type": "object", "required": false, "properties": {"lang": {"type": "string"}}}
                }
            }
        }));

        let response = validate(
            json!({"metadata": {"source": "web", "details": {"lang": "en"}}}),
            &compiled,
        )
        .unwrap();
        let metadata = response.get("metadata").unwrap().as_record().unwrap();
        assert_eq!(metadata.type_name(), "MetadataResponse");
        let details = metadata.get("details").unwrap().as_record().unwrap();
        assert_eq!(details.get("lang").unwrap(), &"en");

        let err = validate(json!({"metadata": {"details": {"lang": 1}}}), &compiled).unwrap_err();
        assert_eq!(err.field, "metadata.source");
        assert_eq!(err.constraints.failures.len(), 2);
        assert_eq!(err.constraints.failures[1].path, "metadata.details.lang");
        assert!(err.message.contains("1 additional validation error(s)"));
    }

    #[test]
    fn test_case_insensitive_keys_and_extras() {
        let response = validate(
            json!({"Sentiment": "negative", "CONFIDENCE": 0.1, "reasoning": "ignored"}),
            &sentiment(),
        )
        .unwrap();
        assert_eq!(response.get("sentiment").unwrap(), &"negative");
        assert_eq!(response.field_names().collect::<Vec<_>>(), vec!["sentiment", "confidence"]);

        let strict = OutputValidator::with_settings(ValidationSettings::new().case_insensitive_keys(false));
        let err = strict
            .validate(json!({"Sentiment": "negative", "confidence": 0.1}), &sentiment())
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::MissingField);
    }

    #[rstest]
    #[case(json!(3), Some(json!(3)))]
    #[case(json!(3.0), Some(json!(3)))]
    #[case(json!(3.5), None)]
    #[case(json!(-9.223372036854775808e18), Some(json!(i64::MIN)))]
    #[case(json!(9.223372036854775808e18), Some(json!(9_223_372_036_854_775_808u64)))]
    #[case(json!(1.8446744073709552e19), None)]
    #[case(json!("3"), None)]
    #[case(json!(true), None)]
    fn test_integer_normalization(#[case] input: JsonValue, #[case] expected: Option<JsonValue>) {
        let compiled = schema(json!({"count": {"type": "integer"}}));
        let result = validate(json!({"count": input}), &compiled);
        match expected {
            Some(value) => assert_eq!(result.unwrap().get("count").unwrap().as_value(), Some(&value)),
            None => assert_eq!(result.unwrap_err().category, ErrorCategory::TypeMismatch),
        }
    }

    #[test]
    fn test_numeric_closed_set_normalizes_to_literal() {
        let compiled = schema(json!({"stars": {"type": "integer", "options": [1, 2, 3]}}));
        let response = validate(json!({"stars": 2.0}), &compiled).unwrap();
        assert_eq!(response.get("stars").unwrap().as_value(), Some(&json!(2)));
    }

    #[test]
    fn test_constraints() {
        let compiled = schema(json!({
            "score": {"type": "number", "minimum": 0, "maximum": 1},
            "code": {"type": "string", "max_length": 3, "pattern": "^[A-Z]+$"},
            "tags": {"type": "array", "min_length": 1}
        }));

        assert!(validate(json!({"score": 0.5, "code": "ABC", "tags": ["x"]}), &compiled).is_ok());

        let err = validate(json!({"score": 1.5, "code": "ABC", "tags": ["x"]}), &compiled).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Range);
        assert!(err.message.contains("between 0 and 1"));

        let err = validate(json!({"score": 0.5, "code": "ABCD", "tags": ["x"]}), &compiled).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Length);

        let err = validate(json!({"score": 0.5, "code": "abc", "tags": ["x"]}), &compiled).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Pattern);

        let err = validate(json!({"score": 0.5, "code": "ABC", "tags": []}), &compiled).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Length);
        assert_eq!(err.field, "tags");
    }

    #[test]
    fn test_non_object_root() {
        let err = validate(json!([1, 2]), &sentiment()).unwrap_err();
        assert_eq!(err.category, ErrorCategory::StructureMismatch);
        assert_eq!(err.field, "SentimentResponse");
    }
}
