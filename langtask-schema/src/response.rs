//! Structured responses.
//!
//! A [`StructuredResponse`] is the immutable keyed record produced by
//! validating data against a [`CompiledType`]. Nested objects are
//! themselves structured responses, so immutability holds at every level.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

use crate::compiled::CompiledType;

/// The value held by one field of a structured response.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An optional field that was omitted and has no default.
    Absent,
    /// A scalar, closed-set literal, array or default value.
    Value(JsonValue),
    /// A nested record.
    Record(StructuredResponse),
}

impl FieldValue {
    /// Whether this is the absent marker.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The underlying JSON value, for non-record fields.
    #[must_use]
    pub fn as_value(&self) -> Option<&JsonValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Get as text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(JsonValue::as_str)
    }

    /// Get as a whole number.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(JsonValue::as_i64)
    }

    /// Get as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(JsonValue::as_f64)
    }

    /// Get as a logical value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(JsonValue::as_bool)
    }

    /// Get as a sequence.
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<JsonValue>> {
        self.as_value().and_then(JsonValue::as_array)
    }

    /// Get as a nested record.
    #[must_use]
    pub fn as_record(&self) -> Option<&StructuredResponse> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Convert to JSON. The absent marker becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Absent => JsonValue::Null,
            Self::Value(v) => v.clone(),
            Self::Record(r) => r.to_json(),
        }
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// An immutable validated record.
#[derive(Debug, Clone)]
pub struct StructuredResponse {
    compiled: Arc<CompiledType>,
    fields: Arc<IndexMap<String, FieldValue>>,
}

impl StructuredResponse {
    /// Assemble a response from per-field values.
    ///
    /// Returns `None` unless `fields` holds exactly the compiled type's
    /// fields, in declaration order.
    #[must_use]
    pub fn try_new(compiled: Arc<CompiledType>, fields: IndexMap<String, FieldValue>) -> Option<Self> {
        let shape_matches = fields.len() == compiled.len()
            && fields.keys().map(String::as_str).eq(compiled.field_names());
        shape_matches.then(|| Self {
            compiled,
            fields: Arc::new(fields),
        })
    }

    /// The compiled type this record was validated against.
    #[must_use]
    pub fn compiled_type(&self) -> &Arc<CompiledType> {
        &self.compiled
    }

    /// The compiled type's name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.compiled.name()
    }

    /// Whether this record was produced from `compiled`.
    #[must_use]
    pub fn is_instance_of(&self, compiled: &Arc<CompiledType>) -> bool {
        Arc::ptr_eq(&self.compiled, compiled) || *self.compiled == **compiled
    }

    /// Look up a field. The name is lowercased before lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .get(name)
            .or_else(|| self.fields.get(&name.to_lowercase()))
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

impl PartialEq for StructuredResponse {
    fn eq(&self, other: &Self) -> bool {
        self.compiled.name() == other.compiled.name() && self.fields == other.fields
    }
}

impl Serialize for StructuredResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
