//! Message - The unit of data flowing through a pipeline.
//!
//! A message carries a discriminant tag (`kind`, serialized as `"type"`) and an
//! arbitrary JSON payload. Tags need not be unique across a system; routing is
//! keyed by tag value only.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tagged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Routing tag.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    /// Marks a message describing a failure.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Message {
    /// Create a message with the given tag and a null payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
            error: false,
            meta: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Flag this message as describing a failure.
    pub fn failed(mut self) -> Self {
        self.error = true;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The payload as a string slice, if it is a JSON string.
    pub fn payload_str(&self) -> Option<&str> {
        self.payload.as_str()
    }

    /// Serialize the whole message, e.g. to embed it as another message's payload.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
