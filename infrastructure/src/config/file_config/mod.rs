//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod agents;
mod game;
mod logging;
mod players;
mod providers;
mod speech;

pub use agents::{DEFAULT_MODEL, FileAgentConfig, FileAgentsConfig};
pub use game::{DEFAULT_INITIAL_SITUATION, FileGameConfig};
pub use logging::FileLoggingConfig;
pub use players::{FilePlayerConfig, default_roster, validate_roster};
pub use providers::{FileGatewayConfig, FileOllamaConfig, FileOpenAiConfig, FileProvidersConfig};
pub use speech::{FileAudioConfig, FileSpeechConfig};

use serde::{Deserialize, Serialize};
use tavern_domain::{ConfigIssue, ConfigIssueCode};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Session settings
    pub game: FileGameConfig,
    /// Dungeon Master, Enforcer and Chronicler models
    pub agents: FileAgentsConfig,
    /// The party, in turn order
    pub players: Vec<FilePlayerConfig>,
    /// Backend endpoints and credentials
    pub providers: FileProvidersConfig,
    /// Retry and timeout policy for model calls
    pub gateway: FileGatewayConfig,
    pub speech: FileSpeechConfig,
    pub audio: FileAudioConfig,
    pub logging: FileLoggingConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            game: FileGameConfig::default(),
            agents: FileAgentsConfig::default(),
            players: default_roster(),
            providers: FileProvidersConfig::default(),
            gateway: FileGatewayConfig::default(),
            speech: FileSpeechConfig::default(),
            audio: FileAudioConfig::default(),
            logging: FileLoggingConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks persona model strings, the roster, and that every speaker has a
    /// voice when speech is enabled.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.agents.validate();
        issues.extend(validate_roster(&self.players));

        if self.game.speech {
            if self.speech.narrator_voice.trim().is_empty() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::MissingVoice,
                    "speech.narrator_voice: the Dungeon Master will stay silent",
                ));
            }
            for player in self.players.iter().filter(|p| p.voice.is_none()) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::MissingVoice,
                    format!("players.{}.voice: this player will stay silent", player.name()),
                ));
            }
        }

        issues
    }
}
