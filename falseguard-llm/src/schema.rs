//! Output contracts for structured model calls.
//!
//! The JSON Schema shown to the model is derived from the output type with
//! `schemars`, and serde enforces the same type on the way back. What neither
//! can express (confidence ranges, blank text) goes in
//! [`StructuredOutput::check`]. Unknown object keys are ignored; models
//! routinely add commentary fields and nothing downstream reads them.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() { "$".into() } else { path.into() },
            message: message.into(),
        }
    }
}

/// A type a model call can be asked to produce.
pub trait StructuredOutput: DeserializeOwned + JsonSchema {
    /// Semantic checks run after deserialization.
    fn check(&self) -> Result<(), SchemaViolation> {
        Ok(())
    }
}

/// JSON Schema for `T`, as embedded in prompts.
pub fn prompt_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}

/// `value` must be a finite number within `[0, 1]`.
pub fn unit_interval(path: &str, value: f64) -> Result<(), SchemaViolation> {
    if !value.is_finite() {
        return Err(SchemaViolation::new(path, "number must be finite"));
    }
    if value < 0.0 {
        return Err(SchemaViolation::new(path, format!("{value} is below 0")));
    }
    if value > 1.0 {
        return Err(SchemaViolation::new(path, format!("{value} is above 1")));
    }
    Ok(())
}

/// `value` must contain at least one non-whitespace character.
pub fn non_blank(path: &str, value: &str) -> Result<(), SchemaViolation> {
    if value.trim().is_empty() {
        return Err(SchemaViolation::new(path, "must not be empty"));
    }
    Ok(())
}
