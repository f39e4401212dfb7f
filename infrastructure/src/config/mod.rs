//! Configuration file loading for tavern
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TAVERN_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./tavern.toml` or `./.tavern.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/tavern/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_INITIAL_SITUATION, DEFAULT_MODEL, FileAgentConfig, FileAgentsConfig, FileAudioConfig,
    FileConfig, FileGameConfig, FileGatewayConfig, FileLoggingConfig, FileOllamaConfig,
    FileOpenAiConfig, FilePlayerConfig, FileProvidersConfig, FileSpeechConfig, default_roster,
    validate_roster,
};
pub use loader::ConfigLoader;
