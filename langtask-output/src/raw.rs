//! Raw output handed to the validator.

use langtask_schema::StructuredResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A provider response wrapper carrying generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// The generated text.
    pub text: String,
    /// Structured data the provider already extracted, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl Generation {
    /// Create a wrapper holding only text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
        }
    }

    /// Attach structured data.
    #[must_use]
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = Some(data);
        self
    }

    /// The payload to validate: the structured data, else the text itself.
    #[must_use]
    pub fn into_payload(self) -> JsonValue {
        self.data.unwrap_or(JsonValue::String(self.text))
    }
}

/// Anything the validator accepts.
#[derive(Debug, Clone)]
pub enum RawOutput {
    /// Plain structured data.
    Data(JsonValue),
    /// A provider response wrapper.
    Generation(Generation),
    /// An already validated record.
    Response(StructuredResponse),
}

impl From<JsonValue> for RawOutput {
    fn from(value: JsonValue) -> Self {
        Self::Data(value)
    }
}

impl From<Generation> for RawOutput {
    fn from(generation: Generation) -> Self {
        Self::Generation(generation)
    }
}

impl From<StructuredResponse> for RawOutput {
    fn from(response: StructuredResponse) -> Self {
        Self::Response(response)
    }
}
