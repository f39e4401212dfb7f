//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid model string '{0}': expected 'provider|model'")]
    InvalidModelSpec(String),

    #[error("Unknown model provider '{0}' (supported: openai, ollama)")]
    UnknownProvider(String),

    #[error("Missing required inputs: [{}]", .0.join(", "))]
    MissingInputs(Vec<String>),

    #[error("Malformed template for task '{task}': {reason}")]
    TemplateFormat { task: String, reason: String },

    #[error("Invalid character sheet: {0}")]
    InvalidCharacter(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
}

impl DomainError {
    /// Errors that stem from bad startup configuration rather than runtime input.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidModelSpec(_)
                | DomainError::UnknownProvider(_)
                | DomainError::InvalidCharacter(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs_lists_every_key() {
        let error = DomainError::MissingInputs(vec!["roll".into(), "character_sheet".into()]);
        assert_eq!(
            error.to_string(),
            "Missing required inputs: [roll, character_sheet]"
        );
    }

    #[test]
    fn test_configuration_classification() {
        assert!(DomainError::UnknownProvider("anthropic".into()).is_configuration());
        assert!(DomainError::InvalidModelSpec("gpt-4o".into()).is_configuration());
        assert!(!DomainError::MissingInputs(vec![]).is_configuration());
        assert!(!DomainError::MalformedOutput("eof".into()).is_configuration());
    }
}
