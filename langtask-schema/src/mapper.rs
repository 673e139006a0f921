//! Type mapping.
//!
//! Maps the primitive type tags a schema definition may declare to the
//! concrete value types checked at validation time.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use std::fmt;

/// A type tag accepted in a field's `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl SchemaType {
    /// Every accepted tag, in declaration order.
    pub const ALL: [SchemaType; 6] = [
        SchemaType::String,
        SchemaType::Integer,
        SchemaType::Number,
        SchemaType::Boolean,
        SchemaType::Array,
        SchemaType::Object,
    ];

    /// The tag as written in a schema.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Parse a tag. Matching is exact.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Names of all accepted tags.
    #[must_use]
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|t| t.as_str().to_string()).collect()
    }

    /// Whether a closed value set may be declared for this tag.
    #[must_use]
    pub fn supports_options(&self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Number)
    }

    /// The concrete value type for this tag.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String => ValueType::Text,
            Self::Integer => ValueType::WholeNumber,
            Self::Number => ValueType::Float,
            Self::Boolean => ValueType::Logical,
            Self::Array => ValueType::Sequence,
            Self::Object => ValueType::Record,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete runtime value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Text.
    Text,
    /// Whole number.
    WholeNumber,
    /// Floating point.
    Float,
    /// Logical.
    Logical,
    /// Ordered sequence of any values.
    Sequence,
    /// Untyped keyed record.
    Record,
}

impl ValueType {
    /// The schema tag this value type is mapped from.
    #[must_use]
    pub fn schema_type(&self) -> SchemaType {
        match self {
            Self::Text => SchemaType::String,
            Self::WholeNumber => SchemaType::Integer,
            Self::Float => SchemaType::Number,
            Self::Logical => SchemaType::Boolean,
            Self::Sequence => SchemaType::Array,
            Self::Record => SchemaType::Object,
        }
    }

    /// Whether a value already has exactly this runtime type.
    ///
    /// Used for literals in a schema, where no normalization applies.
    #[must_use]
    pub fn is_exact(&self, value: &JsonValue) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::WholeNumber => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Logical => value.is_boolean(),
            Self::Sequence => value.is_array(),
            Self::Record => value.is_object(),
        }
    }

    /// Normalize a data value into this type, or `None` if it is not assignable.
    ///
    /// Whole numbers accept floats without a fractional part; floats accept
    /// any number. Nothing else is converted.
    #[must_use]
    pub fn normalize(&self, value: &JsonValue) -> Option<JsonValue> {
        match (self, value) {
            (Self::WholeNumber, JsonValue::Number(n)) => whole_number(n).map(JsonValue::Number),
            _ if self.is_exact(value) => Some(value.clone()),
            _ => None,
        }
    }
}

fn whole_number(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }
    let f = n.as_f64()?;
    // i64::MAX and u64::MAX round up to 2^63 and 2^64 as f64, so both bounds are exclusive.
    if !f.is_finite() || f.fract() != 0.0 {
        None
    } else if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Number::from(f as u64))
    } else {
        None
    }
}
