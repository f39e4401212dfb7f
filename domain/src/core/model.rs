//! Model specification value objects
//!
//! Personas name their backing model with a `provider|model` string, e.g.
//! `openai|gpt-4o-mini` or `ollama|llama3.1`. The string is parsed once, at
//! persona construction, so a misconfigured roster fails at startup instead of
//! mid-turn.

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Backend family that serves a model (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted chat-completion API (OpenAI or compatible)
    OpenAi,
    /// Locally hosted Ollama generation API
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Whether the backend can be forced to return schema-shaped JSON.
    pub fn supports_structured_output(&self) -> bool {
        matches!(self, ProviderKind::OpenAi)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// A parsed `provider|model` pair (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelSpec {
    provider: ProviderKind,
    model: String,
}

impl ModelSpec {
    pub const DELIMITER: char = '|';

    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into().to_lowercase(),
        }
    }

    /// Parse a `provider|model` string.
    ///
    /// The provider token is case-insensitive and the model name is
    /// lower-cased.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let mut parts = s.split(Self::DELIMITER);
        let (Some(provider), Some(model), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DomainError::InvalidModelSpec(s.to_string()));
        };

        let (provider, model) = (provider.trim(), model.trim());
        if provider.is_empty() || model.is_empty() {
            return Err(DomainError::InvalidModelSpec(s.to_string()));
        }

        Ok(Self::new(provider.parse()?, model))
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.provider, Self::DELIMITER, self.model)
    }
}

impl FromStr for ModelSpec {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelSpec::parse(s)
    }
}

impl Serialize for ModelSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModelSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ModelSpec::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Who produces a persona's utterances.
///
/// Decided once from configuration: the literal `human` selects console (or
/// front-end) input, anything else must be a [`ModelSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controller {
    Model(ModelSpec),
    Human,
}

impl Controller {
    pub const HUMAN: &'static str = "human";

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.trim().eq_ignore_ascii_case(Self::HUMAN) {
            Ok(Controller::Human)
        } else {
            ModelSpec::parse(s).map(Controller::Model)
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Controller::Human)
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Controller::Model(spec) => spec.fmt(f),
            Controller::Human => f.write_str(Self::HUMAN),
        }
    }
}

impl FromStr for Controller {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Controller::parse(s)
    }
}
