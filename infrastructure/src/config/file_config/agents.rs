//! Non-player persona settings from TOML (`[agents]` section)

use serde::{Deserialize, Serialize};
use tavern_domain::{ConfigIssue, ConfigIssueCode, Controller, ModelSpec};

/// Model used when a persona does not name one.
pub const DEFAULT_MODEL: &str = "openai|gpt-4o-mini";

/// One persona's model binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAgentConfig {
    /// `provider|model`, e.g. `"ollama|llama3"`
    pub model: String,
    pub temperature: f32,
}

impl FileAgentConfig {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }

    /// Parse the model string, reporting an issue against `field` on failure.
    pub fn parse_model(&self, field: &str) -> (Option<ModelSpec>, Vec<ConfigIssue>) {
        match ModelSpec::parse(&self.model) {
            Ok(spec) => (Some(spec), Vec::new()),
            Err(e) => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidModel,
                    format!("{field}.model: {e}"),
                )],
            ),
        }
    }
}

/// # Example
///
/// ```toml
/// [agents.dm]
/// model = "openai|gpt-4o"
/// temperature = 0.7
///
/// [agents.enforcer]
/// model = "ollama|llama3"
/// temperature = 0.2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentsConfig {
    pub dm: FileAgentConfig,
    pub enforcer: FileAgentConfig,
    pub chronicler: FileAgentConfig,
}

impl Default for FileAgentsConfig {
    fn default() -> Self {
        Self {
            dm: FileAgentConfig::new(DEFAULT_MODEL, 0.7),
            enforcer: FileAgentConfig::new(DEFAULT_MODEL, 0.7),
            chronicler: FileAgentConfig::new(DEFAULT_MODEL, 0.3),
        }
    }
}

impl FileAgentsConfig {
    /// The personas as `(field, config)` pairs.
    pub fn entries(&self) -> [(&'static str, &FileAgentConfig); 3] {
        [
            ("agents.dm", &self.dm),
            ("agents.enforcer", &self.enforcer),
            ("agents.chronicler", &self.chronicler),
        ]
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, agent) in self.entries() {
            if matches!(Controller::parse(&agent.model), Ok(Controller::Human)) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidModel,
                    format!("{field}.model: only players can be controlled by a human"),
                ));
            } else {
                issues.extend(agent.parse_model(field).1);
            }
        }
        issues
    }
}
