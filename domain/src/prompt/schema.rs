//! Output schemas for structured (JSON) task results.

use crate::core::error::DomainError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes the JSON object a structured task must return.
///
/// `parameters` builds the JSON-schema document sent to the provider,
/// `validator` checks a returned value against the Rust type it will be
/// decoded into.
#[derive(Debug, Clone, Copy)]
pub struct OutputSchema {
    pub name: &'static str,
    pub description: &'static str,
    parameters: fn() -> Value,
    validator: fn(&Value) -> Result<(), String>,
}

impl OutputSchema {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        parameters: fn() -> Value,
        validator: fn(&Value) -> Result<(), String>,
    ) -> Self {
        Self {
            name,
            description,
            parameters,
            validator,
        }
    }

    pub fn parameters(&self) -> Value {
        (self.parameters)()
    }

    pub fn validate(&self, value: &Value) -> Result<(), String> {
        (self.validator)(value)
    }
}

/// Validator that accepts any value decodable as `T`.
pub fn validate_as<T: DeserializeOwned>(value: &Value) -> Result<(), String> {
    serde_json::from_value::<T>(value.clone())
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Result of executing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentOutput {
    Text(String),
    Structured(Value),
}

impl AgentOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AgentOutput::Text(text) => Some(text),
            AgentOutput::Structured(_) => None,
        }
    }

    /// Text content, or compact JSON for structured results.
    pub fn into_text(self) -> String {
        match self {
            AgentOutput::Text(text) => text,
            AgentOutput::Structured(value) => value.to_string(),
        }
    }

    /// Decode into a typed value. Text output is parsed as JSON.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        let decoded = match self {
            AgentOutput::Structured(value) => serde_json::from_value(value.clone()),
            AgentOutput::Text(text) => serde_json::from_str(text),
        };
        decoded.map_err(|e| DomainError::MalformedOutput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Verdict {
        #[allow(dead_code)]
        guilty: bool,
    }

    fn verdict_parameters() -> Value {
        json!({"type": "object", "properties": {"guilty": {"type": "boolean"}}})
    }

    const VERDICT: OutputSchema =
        OutputSchema::new("verdict", "A verdict", verdict_parameters, validate_as::<Verdict>);

    #[test]
    fn test_schema_validation() {
        assert!(VERDICT.validate(&json!({"guilty": true})).is_ok());
        assert!(VERDICT.validate(&json!({"guilty": "maybe"})).is_err());
        assert_eq!(VERDICT.parameters()["type"], "object");
    }

    #[test]
    fn test_output_into_text() {
        assert_eq!(AgentOutput::Text("hi".into()).into_text(), "hi");
        assert_eq!(
            AgentOutput::Structured(json!({"a": 1})).into_text(),
            "{\"a\":1}"
        );
    }

    #[test]
    fn test_parse_text_as_json() {
        let out = AgentOutput::Text("{\"guilty\": false}".into());
        assert!(out.parse::<Verdict>().is_ok());
        let bad = AgentOutput::Text("not json".into());
        assert!(matches!(
            bad.parse::<Verdict>(),
            Err(DomainError::MalformedOutput(_))
        ));
    }
}
