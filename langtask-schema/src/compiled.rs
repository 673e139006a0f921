//! Compiled types.
//!
//! A [`CompiledType`] is the runtime-checked tree built from a schema
//! definition. Each field is one of four tagged kinds (scalar, closed set,
//! array, nested object); a single generic validator walks the tree.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

use crate::mapper::{SchemaType, ValueType};
use crate::response::FieldValue;

/// The runtime-checked structural type derived from a schema definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledType {
    name: String,
    fields: IndexMap<String, CompiledField>,
}

impl CompiledType {
    pub(crate) fn new(name: impl Into<String>, fields: IndexMap<String, CompiledField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The type name, e.g. `SentimentSchemaResponse`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field by its normalized name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &CompiledField> {
        self.fields.values()
    }

    /// Normalized field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the type declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of object levels, counting this one.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self
            .fields()
            .filter_map(|f| match &f.kind {
                FieldKind::Object(nested) => Some(nested.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Render a JSON-Schema-shaped description of this type.
    ///
    /// Provider adapters can hand this to structured-output APIs.
    #[must_use]
    pub fn json_schema(&self) -> JsonValue {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in self.fields() {
            properties.insert(field.name.clone(), field.json_schema());
            if field.required {
                required.push(JsonValue::String(field.name.clone()));
            }
        }

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// One compiled field.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledField {
    /// Normalized (lowercase) name.
    pub name: String,
    /// What values the field holds.
    pub kind: FieldKind,
    /// Whether the field must be present in data.
    pub required: bool,
    /// Declared default, used only for non-required fields.
    pub default: Option<JsonValue>,
    /// Free-form description.
    pub description: Option<String>,
    /// Free-form title.
    pub title: Option<String>,
    /// Bounds, lengths and pattern.
    pub constraints: FieldConstraints,
}

impl CompiledField {
    /// The value an omitted field takes.
    ///
    /// `None` for required fields, which cannot be omitted.
    #[must_use]
    pub fn resolved_default(&self) -> Option<FieldValue> {
        if self.required {
            return None;
        }
        Some(match &self.default {
            Some(value) => FieldValue::Value(value.clone()),
            None => FieldValue::Absent,
        })
    }

    /// The schema tag this field was declared with.
    #[must_use]
    pub fn schema_type(&self) -> SchemaType {
        match &self.kind {
            FieldKind::Scalar(value_type) => value_type.schema_type(),
            FieldKind::ClosedSet(set) => set.base.schema_type(),
            FieldKind::Array => SchemaType::Array,
            FieldKind::Object(_) => SchemaType::Object,
        }
    }

    fn json_schema(&self) -> JsonValue {
        let mut schema = match &self.kind {
            FieldKind::Object(nested) => nested.json_schema(),
            FieldKind::ClosedSet(set) => json!({
                "type": set.base.schema_type().as_str(),
                "enum": set.values(),
            }),
            _ => json!({ "type": self.schema_type().as_str() }),
        };

        if let Some(obj) = schema.as_object_mut() {
            let c = &self.constraints;
            if let Some(min) = c.minimum {
                obj.insert("minimum".into(), json!(min));
            }
            if let Some(max) = c.maximum {
                obj.insert("maximum".into(), json!(max));
            }
            let (min_key, max_key) = if self.schema_type() == SchemaType::Array {
                ("minItems", "maxItems")
            } else {
                ("minLength", "maxLength")
            };
            if let Some(min) = c.min_length {
                obj.insert(min_key.into(), json!(min));
            }
            if let Some(max) = c.max_length {
                obj.insert(max_key.into(), json!(max));
            }
            if let Some(pattern) = &c.pattern {
                obj.insert("pattern".into(), json!(pattern.as_str()));
            }
            if let Some(default) = &self.default {
                obj.insert("default".into(), default.clone());
            }
            if let Some(description) = &self.description {
                obj.insert("description".into(), json!(description));
            }
            if let Some(title) = &self.title {
                obj.insert("title".into(), json!(title));
            }
        }
        schema
    }
}

/// The tagged kinds a compiled field can take.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A text, whole number, float or logical value.
    Scalar(ValueType),
    /// One of an exact set of literals.
    ClosedSet(ClosedSet),
    /// An ordered sequence of any values.
    Array,
    /// A nested record.
    Object(Arc<CompiledType>),
}

/// A closed value set captured at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSet {
    /// The declared scalar type.
    pub base: ValueType,
    /// Allowed literals in declaration order.
    pub literals: Vec<Literal>,
}

impl ClosedSet {
    /// The literal matching `value`, if any.
    #[must_use]
    pub fn find(&self, value: &JsonValue) -> Option<&Literal> {
        self.literals.iter().find(|l| l.matches(value))
    }

    /// Allowed literals as JSON values.
    #[must_use]
    pub fn values(&self) -> Vec<JsonValue> {
        self.literals.iter().map(Literal::to_json).collect()
    }
}

/// A single allowed literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Text literal, compared exactly.
    Text(String),
    /// Whole number literal.
    Integer(i64),
    /// Floating point literal, compared numerically.
    Number(f64),
}

impl Literal {
    /// Whether a data value equals this literal.
    #[must_use]
    pub fn matches(&self, value: &JsonValue) -> bool {
        match self {
            Self::Text(s) => value.as_str() == Some(s.as_str()),
            Self::Integer(i) => match value {
                JsonValue::Number(n) => {
                    n.as_i64() == Some(*i) || n.as_f64().is_some_and(|f| f.fract() == 0.0 && f == *i as f64)
                }
                _ => false,
            },
            Self::Number(x) => value.as_f64() == Some(*x),
        }
    }

    /// The bare literal value.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Integer(i) => json!(i),
            Self::Number(x) => json!(x),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Number(x) => write!(f, "{}", x),
        }
    }
}

/// Optional bounds declared on a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldConstraints {
    /// Inclusive lower numeric bound.
    pub minimum: Option<f64>,
    /// Inclusive upper numeric bound.
    pub maximum: Option<f64>,
    /// Minimum characters (text) or elements (array).
    pub min_length: Option<usize>,
    /// Maximum characters (text) or elements (array).
    pub max_length: Option<usize>,
    /// Pattern text must match.
    pub pattern: Option<FieldPattern>,
}

impl FieldConstraints {
    /// Whether no constraint is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.maximum.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }
}

/// A compiled `pattern`.
#[derive(Debug, Clone)]
pub struct FieldPattern(Regex);

impl FieldPattern {
    pub(crate) fn new(regex: Regex) -> Self {
        Self(regex)
    }

    /// The pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether text contains a match.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
