//! Structured findings produced when validating configuration.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the session cannot start.
    Error,
    /// Non-fatal: the session starts but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A model string does not parse as `provider|model` or `human`.
    InvalidModel,
    /// The roster is empty.
    NoPlayers,
    /// A player has an empty name.
    EmptyPlayerName,
    /// Two players share a name.
    DuplicatePlayerName,
    /// A character sheet is missing personality entries.
    IncompleteCharacterSheet,
    /// More than one player is driven by a human.
    MultipleHumans,
    /// Speech is enabled but no voice is configured for a speaker.
    MissingVoice,
}

/// A detected issue in the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
