//! Validation issue types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// A single mismatch between a value and a schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    /// Dotted path of the offending field (`""` for the root value)
    pub path: String,
    /// Human-readable error message
    pub message: String,
    /// The offending value, absent when the field was missing
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Value>,
}

impl ValidationIssue {
    /// Create an issue for a missing value
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Create an issue carrying the offending value
    pub fn with_value(path: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            value: Some(value),
        }
    }

    /// JSON representation used in error envelopes
    pub fn to_json(&self) -> Value {
        match &self.value {
            Some(value) => json!({ "path": self.path, "message": self.message, "value": value }),
            None => json!({ "path": self.path, "message": self.message }),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Render a list of issues as a JSON array
pub fn issues_to_json(issues: &[ValidationIssue]) -> Value {
    Value::Array(issues.iter().map(ValidationIssue::to_json).collect())
}
