//! Schema compilation.
//!
//! Walks a schema definition depth-first, checking each field spec against
//! the schema grammar, and builds the [`CompiledType`] tree bottom-up.

use indexmap::IndexMap;
use langtask_core::{
    value_kind, ClassifiedError, CompileFailure, ErrorClassifier, ValidationSettings,
};
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::compiled::{ClosedSet, CompiledField, CompiledType, FieldConstraints, FieldKind, FieldPattern, Literal};
use crate::mapper::{SchemaType, ValueType};

/// Compiles schema definitions into [`CompiledType`]s.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    settings: ValidationSettings,
    classifier: ErrorClassifier,
}

/// Where in which schema a field is being compiled.
struct Site<'a> {
    identity: &'a str,
    path: &'a str,
}

impl SchemaCompiler {
    /// Create a compiler with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with custom settings.
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

    /// Compile a definition.
    ///
    /// An absent or empty definition yields `Ok(None)`. `identity` names the
    /// schema in diagnostics and its file stem names the compiled type.
    pub fn compile(
        &self,
        definition: Option<&JsonValue>,
        identity: &str,
    ) -> Result<Option<Arc<CompiledType>>, ClassifiedError> {
        let Some(definition) = definition.filter(|d| !is_empty_definition(d)) else {
            debug!(schema = %identity, "Schema definition is empty");
            return Ok(None);
        };

        let start = Instant::now();
        debug!(schema = %identity, "Compiling schema");

        let name = type_name(identity_stem(identity));
        match self.compile_fields(identity, definition, "", 0, name) {
            Ok(compiled) => {
                debug!(
                    schema = %identity,
                    type_name = compiled.name(),
                    field_count = compiled.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Schema compiled"
                );
                Ok(Some(compiled))
            }
            Err(e) => {
                warn!(
                    schema = %identity,
                    field = %e.field,
                    category = %e.category,
                    error = %e.message,
                    "Schema compilation failed"
                );
                Err(e)
            }
        }
    }

    fn fail(&self, site: &Site<'_>, failure: CompileFailure) -> ClassifiedError {
        self.classifier
            .classify_compile(site.identity, site.path, failure)
    }

    fn compile_fields(
        &self,
        identity: &str,
        mapping: &JsonValue,
        path: &str,
        depth: usize,
        name: String,
    ) -> Result<Arc<CompiledType>, ClassifiedError> {
        let Some(entries) = mapping.as_object() else {
            let site = Site { identity, path };
            return Err(self.fail(
                &site,
                CompileFailure::NotAMapping {
                    found: value_kind(mapping).to_string(),
                },
            ));
        };

        let mut fields = IndexMap::with_capacity(entries.len());
        for (raw_name, spec) in entries {
            let normalized = raw_name.to_lowercase();
            let field_path = join_path(path, &normalized);
            let site = Site {
                identity,
                path: &field_path,
            };
            if fields.contains_key(&normalized) {
                return Err(self.fail(&site, CompileFailure::DuplicateField { normalized }));
            }
            let field = self.compile_field(&site, &normalized, spec, depth)?;
            fields.insert(normalized, field);
        }

        Ok(Arc::new(CompiledType::new(name, fields)))
    }

    fn compile_field(
        &self,
        site: &Site<'_>,
        name: &str,
        spec: &JsonValue,
        depth: usize,
    ) -> Result<CompiledField, ClassifiedError> {
        let Some(spec) = spec.as_object() else {
            return Err(self.fail(
                site,
                CompileFailure::NotAMapping {
                    found: value_kind(spec).to_string(),
                },
            ));
        };

        let schema_type = match spec.get("type") {
            None => {
                return Err(self.fail(
                    site,
                    CompileFailure::MissingType {
                        allowed: SchemaType::names(),
                    },
                ))
            }
            Some(tag) => tag.as_str().and_then(SchemaType::parse).ok_or_else(|| {
                self.fail(
                    site,
                    CompileFailure::InvalidType {
                        found: tag.clone(),
                        allowed: SchemaType::names(),
                    },
                )
            })?,
        };

        let kind = if let Some(options) = spec.get("options") {
            FieldKind::ClosedSet(self.closed_set(site, schema_type, options)?)
        } else {
            match schema_type {
                SchemaType::Object => {
                    FieldKind::Object(self.nested(site, name, spec, depth)?)
                }
                SchemaType::Array => FieldKind::Array,
                other => FieldKind::Scalar(other.value_type()),
            }
        };

        let required = match declared(spec, "required") {
            None => true,
            Some(JsonValue::Bool(b)) => *b,
            Some(other) => {
                return Err(self.fail(
                    site,
                    CompileFailure::Constraint {
                        keyword: "required".into(),
                        reason: format!("expected true or false, found {}", other),
                    },
                ))
            }
        };

        Ok(CompiledField {
            name: name.to_string(),
            kind,
            required,
            default: declared(spec, "default").cloned(),
            description: text(spec, "description"),
            title: text(spec, "title"),
            constraints: self.constraints(site, schema_type, spec)?,
        })
    }

    fn nested(
        &self,
        site: &Site<'_>,
        name: &str,
        spec: &Map<String, JsonValue>,
        depth: usize,
    ) -> Result<Arc<CompiledType>, ClassifiedError> {
        let max = self.settings.max_nesting_depth;
        if depth >= max {
            return Err(self.fail(
                site,
                CompileFailure::DepthExceeded {
                    depth: depth + 1,
                    max,
                },
            ));
        }

        let properties = declared(spec, "properties")
            .filter(|p| !p.as_object().is_some_and(Map::is_empty))
            .ok_or_else(|| self.fail(site, CompileFailure::MissingProperties))?;

        if !properties.is_object() {
            let properties_path = join_path(site.path, "properties");
            let nested_site = Site {
                identity: site.identity,
                path: &properties_path,
            };
            return Err(self.fail(
                &nested_site,
                CompileFailure::NotAMapping {
                    found: value_kind(properties).to_string(),
                },
            ));
        }

        self.compile_fields(site.identity, properties, site.path, depth + 1, type_name(name))
    }

    fn closed_set(
        &self,
        site: &Site<'_>,
        schema_type: SchemaType,
        options: &JsonValue,
    ) -> Result<ClosedSet, ClassifiedError> {
        let invalid = |reason: String| {
            self.fail(
                site,
                CompileFailure::Options {
                    reason,
                    values: options.clone(),
                },
            )
        };

        if !schema_type.supports_options() {
            return Err(invalid(format!(
                "options are only supported for string, integer and number fields, not '{}'",
                schema_type
            )));
        }

        let items = options
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| invalid("options must be a non-empty list".into()))?;

        let base = schema_type.value_type();
        let mut literals = Vec::with_capacity(items.len());
        for item in items {
            let literal = match base {
                ValueType::Text => item.as_str().map(|s| Literal::Text(s.to_string())),
                ValueType::WholeNumber => item.as_i64().map(Literal::Integer),
                ValueType::Float => item.as_f64().map(Literal::Number),
                _ => None,
            };
            let Some(literal) = literal else {
                return Err(invalid(format!(
                    "option {} does not match type '{}'",
                    item, schema_type
                )));
            };
            if literals.contains(&literal) {
                return Err(invalid(format!("option {} is declared more than once", item)));
            }
            literals.push(literal);
        }

        Ok(ClosedSet { base, literals })
    }

    fn constraints(
        &self,
        site: &Site<'_>,
        schema_type: SchemaType,
        spec: &Map<String, JsonValue>,
    ) -> Result<FieldConstraints, ClassifiedError> {
        let invalid = |keyword: &str, reason: String| {
            self.fail(
                site,
                CompileFailure::Constraint {
                    keyword: keyword.to_string(),
                    reason,
                },
            )
        };
        let unsupported =
            |keyword: &str| invalid(keyword, format!("not supported on '{}' fields", schema_type));

        let numeric = matches!(schema_type, SchemaType::Integer | SchemaType::Number);
        let measurable = matches!(schema_type, SchemaType::String | SchemaType::Array);

        let mut bounds = [None, None];
        for (slot, keyword) in bounds.iter_mut().zip(["minimum", "maximum"]) {
            if let Some(value) = declared(spec, keyword) {
                if !numeric {
                    return Err(unsupported(keyword));
                }
                let bound = value
                    .as_f64()
                    .ok_or_else(|| invalid(keyword, format!("expected a number, found {}", value)))?;
                *slot = Some(bound);
            }
        }
        let [minimum, maximum] = bounds;

        let mut lengths = [None, None];
        for (slot, keyword) in lengths.iter_mut().zip(["min_length", "max_length"]) {
            if let Some(value) = declared(spec, keyword) {
                if !measurable {
                    return Err(unsupported(keyword));
                }
                let length = value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| {
                        invalid(keyword, format!("expected a non-negative integer, found {}", value))
                    })?;
                *slot = Some(length);
            }
        }
        let [min_length, max_length] = lengths;

        if let (Some(min), Some(max)) = (minimum, maximum) {
            if min > max {
                return Err(invalid("minimum", format!("{} is greater than maximum {}", min, max)));
            }
        }
        if let (Some(min), Some(max)) = (min_length, max_length) {
            if min > max {
                return Err(invalid(
                    "min_length",
                    format!("{} is greater than max_length {}", min, max),
                ));
            }
        }

        let pattern = match declared(spec, "pattern") {
            None => None,
            Some(_) if schema_type != SchemaType::String => return Err(unsupported("pattern")),
            Some(value) => {
                let source = value
                    .as_str()
                    .ok_or_else(|| invalid("pattern", format!("expected text, found {}", value)))?;
                let regex = Regex::new(source).map_err(|e| invalid("pattern", e.to_string()))?;
                Some(FieldPattern::new(regex))
            }
        };

        Ok(FieldConstraints {
            minimum,
            maximum,
            min_length,
            max_length,
            pattern,
        })
    }
}

/// Compile a definition with default settings.
pub fn compile(
    definition: Option<&JsonValue>,
    identity: &str,
) -> Result<Option<Arc<CompiledType>>, ClassifiedError> {
    SchemaCompiler::new().compile(definition, identity)
}

/// Name of the type compiled from a schema stem or field name.
///
/// `sentiment_schema` becomes `SentimentSchemaResponse`.
#[must_use]
pub fn type_name(stem: &str) -> String {
    let mut name: String = stem
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect();
    name.push_str("Response");
    name
}

fn identity_stem(identity: &str) -> &str {
    Path::new(identity)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(identity)
}

fn is_empty_definition(definition: &JsonValue) -> bool {
    match definition {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// A key's value, treating an explicit `null` as undeclared.
///
/// Only for optional keywords; `type` and `options` reject a present `null`.
fn declared<'a>(spec: &'a Map<String, JsonValue>, key: &str) -> Option<&'a JsonValue> {
    spec.get(key).filter(|v| !v.is_null())
}

fn text(spec: &Map<String, JsonValue>, key: &str) -> Option<String> {
    spec.get(key).and_then(JsonValue::as_str).map(str::to_string)
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
    use langtask_core::ErrorCategory;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn sentiment_definition() -> JsonValue {
        json!({
            "Sentiment": {"type": "string", "options": ["positive", "negative", "neutral"]},
            "confidence": {"type": "number", "required": false, "default": 0.0},
            "metadata": {
                "type": "object",
                "required": false,
                "properties": {"source": {"type": "string", "description": "Origin"}}
            }
        })
    }

    fn nested(levels: usize) -> JsonValue {
        let mut spec = json!({"leaf": {"type": "string"}});
        for i in (0..levels).rev() {
            let mut map = Map::new();
            map.insert(
                format!("level{}", i),
                json!({"type": "object", "properties": spec}),
            );
            spec = JsonValue::Object(map);
        }
        spec
    }

    fn compile_err(definition: JsonValue) -> ClassifiedError {
        compile(Some(&definition), "/schemas/test_schema.yaml").unwrap_err()
    }

    #[test]
    fn test_compile_sentiment_schema() {
        let compiled = compile(Some(&sentiment_definition()), "/schemas/sentiment_schema.yaml")
            .unwrap()
            .unwrap();

        assert_eq!(compiled.name(), "SentimentSchemaResponse");
        assert_eq!(
            compiled.field_names().collect::<Vec<_>>(),
            vec!["sentiment", "confidence", "metadata"]
        );

        let sentiment = compiled.field("sentiment").unwrap();
        assert!(sentiment.required);
        match &sentiment.kind {
            FieldKind::ClosedSet(set) => {
                assert_eq!(set.values(), vec![json!("positive"), json!("negative"), json!("neutral")])
            }
            other => panic!("expected closed set, got {:?}", other),
        }

        let confidence = compiled.field("confidence").unwrap();
        assert!(!confidence.required);
        assert_eq!(confidence.default, Some(json!(0.0)));
        assert_eq!(confidence.kind, FieldKind::Scalar(ValueType::Float));

        match &compiled.field("metadata").unwrap().kind {
            FieldKind::Object(inner) => {
                assert_eq!(inner.name(), "MetadataResponse");
                assert_eq!(
                    inner.field("source").unwrap().description.as_deref(),
                    Some("Origin")
                );
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some(json!(null)))]
    #[case(Some(json!({})))]
    #[case(Some(json!([])))]
    #[case(Some(json!("")))]
    fn test_absent_definition(#[case] definition: Option<JsonValue>) {
        let compiled = compile(definition.as_ref(), "/schemas/empty.yaml").unwrap();
        assert!(compiled.is_none());
    }

    #[test]
    fn test_object_without_properties() {
        let err = compile_err(json!({"metadata": {"type": "object"}}));
        assert_eq!(err.category, ErrorCategory::ObjectProperties);
        assert_eq!(err.field, "metadata");

        let err = compile_err(json!({
            "outer": {"type": "object", "properties": {"inner": {"type": "object", "properties": {}}}}
        }));
        assert_eq!(err.category, ErrorCategory::ObjectProperties);
        assert_eq!(err.field, "outer.inner");
    }

    #[test]
    fn test_nesting_depth_limit() {
        assert!(compile(Some(&nested(4)), "/schemas/deep.yaml").unwrap().is_some());

        let err = compile_err(nested(5));
        assert_eq!(err.category, ErrorCategory::NestingDepth);
        assert_eq!(err.field, "level0.level1.level2.level3.level4");
        assert_eq!(err.constraints.details["max_depth"], json!(4));
    }

    #[test]
    fn test_custom_depth_limit() {
        let compiler = SchemaCompiler::with_settings(ValidationSettings::new().max_nesting_depth(1));
        assert!(compiler.compile(Some(&nested(1)), "s").unwrap().is_some());
        let err = compiler.compile(Some(&nested(2)), "s").unwrap_err();
        assert_eq!(err.category, ErrorCategory::NestingDepth);
    }

    #[test]
    fn test_missing_and_invalid_type() {
        let err = compile_err(json!({"name": {"description": "no type"}}));
        assert_eq!(err.category, ErrorCategory::MissingType);
        assert_eq!(err.field, "name");
        assert!(err.message.contains("string, integer, number, boolean, array, object"));

        let err = compile_err(json!({"name": {"type": "text"}}));
        assert_eq!(err.category, ErrorCategory::InvalidType);
        assert_eq!(err.constraints.details["invalid_type"], json!("text"));
    }

    #[test]
    fn test_null_type_is_invalid_not_missing() {
        let err = compile_err(json!({"name": {"type": null}}));
        assert_eq!(err.category, ErrorCategory::InvalidType);
        assert_eq!(err.field, "name");
    }

    #[rstest]
    #[case(json!({"flag": {"type": "boolean", "options": [true, false]}}))]
    #[case(json!({"tags": {"type": "array", "options": [[1]]}}))]
    #[case(json!({"label": {"type": "string", "options": []}}))]
    #[case(json!({"label": {"type": "string", "options": "positive"}}))]
    #[case(json!({"label": {"type": "string", "options": ["a", 1]}}))]
    #[case(json!({"count": {"type": "integer", "options": [1, 2.5]}}))]
    #[case(json!({"label": {"type": "string", "options": ["a", "a"]}}))]
    #[case(json!({"label": {"type": "string", "options": null}}))]
    fn test_invalid_options(#[case] definition: JsonValue) {
        let err = compile_err(definition);
        assert_eq!(err.category, ErrorCategory::Options);
    }

    #[test]
    fn test_numeric_options() {
        let compiled = compile(
            Some(&json!({"stars": {"type": "integer", "options": [1, 2, 3]}})),
            "ratings",
        )
        .unwrap()
        .unwrap();
        match &compiled.field("stars").unwrap().kind {
            FieldKind::ClosedSet(set) => {
                assert_eq!(set.base, ValueType::WholeNumber);
                assert_eq!(set.literals, vec![Literal::Integer(1), Literal::Integer(2), Literal::Integer(3)]);
            }
            other => panic!("expected closed set, got {:?}", other),
        }
    }

    #[test]
    fn test_structure_errors() {
        let err = compile_err(json!(["sentiment"]));
        assert_eq!(err.category, ErrorCategory::Structure);
        assert_eq!(err.field, "/schemas/test_schema.yaml");

        let err = compile_err(json!({"sentiment": "string"}));
        assert_eq!(err.category, ErrorCategory::Structure);
        assert_eq!(err.field, "sentiment");

        let err = compile_err(json!({"Name": {"type": "string"}, "name": {"type": "string"}}));
        assert_eq!(err.category, ErrorCategory::Structure);
        assert_eq!(err.constraints.details["normalized_name"], json!("name"));
    }

    #[test]
    fn test_error_paths_use_normalized_names() {
        let err = compile_err(json!({
            "Outer": {"type": "object", "properties": {"Inner": {"type": "object"}}}
        }));
        assert_eq!(err.category, ErrorCategory::ObjectProperties);
        assert_eq!(err.field, "outer.inner");
    }

    #[test]
    fn test_constraints() {
        let compiled = compile(
            Some(&json!({
                "score": {"type": "number", "minimum": 0, "maximum": 1},
                "code": {"type": "string", "min_length": 2, "max_length": 3, "pattern": "^[A-Z]+$"},
                "tags": {"type": "array", "max_length": 5}
            })),
            "constrained",
        )
        .unwrap()
        .unwrap();

        let score = &compiled.field("score").unwrap().constraints;
        assert_eq!((score.minimum, score.maximum), (Some(0.0), Some(1.0)));
        let code = &compiled.field("code").unwrap().constraints;
        assert_eq!((code.min_length, code.max_length), (Some(2), Some(3)));
        assert!(code.pattern.as_ref().unwrap().is_match("ABC"));
        assert_eq!(compiled.field("tags").unwrap().constraints.max_length, Some(5));
    }

    #[rstest]
    #[case(json!({"a": {"type": "string", "minimum": 1}}), "minimum")]
    #[case(json!({"a": {"type": "number", "maximum": "high"}}), "maximum")]
    #[case(json!({"a": {"type": "number", "minimum": 5, "maximum": 1}}), "minimum")]
    #[case(json!({"a": {"type": "integer", "max_length": 3}}), "max_length")]
    #[case(json!({"a": {"type": "string", "min_length": -1}}), "min_length")]
    #[case(json!({"a": {"type": "string", "min_length": 4, "max_length": 2}}), "min_length")]
    #[case(json!({"a": {"type": "array", "pattern": "x"}}), "pattern")]
    #[case(json!({"a": {"type": "string", "pattern": "("}}), "pattern")]
    #[case(json!({"a": {"type": "string", "required": "yes"}}), "required")]
    fn test_invalid_constraints(#[case] definition: JsonValue, #[case] keyword: &str) {
        let err = compile_err(definition);
        assert_eq!(err.category, ErrorCategory::Constraint);
        assert_eq!(err.constraints.details["keyword"], json!(keyword));
    }

    #[test]
    fn test_null_default_is_no_default() {
        let compiled = compile(
            Some(&json!({"note": {"type": "string", "required": false, "default": null}})),
            "notes",
        )
        .unwrap()
        .unwrap();
        assert_eq!(compiled.field("note").unwrap().default, None);
    }

    #[rstest]
    #[case("sentiment_schema", "SentimentSchemaResponse")]
    #[case("metadata", "MetadataResponse")]
    #[case("SENTIMENT", "SentimentResponse")]
    #[case("a__b_", "ABResponse")]
    fn test_type_name(#[case] stem: &str, #[case] expected: &str) {
        assert_eq!(type_name(stem), expected);
    }
}
