//! Infrastructure layer for tavern
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: model providers, speech synthesis, audio
//! playback, transcript logging and configuration file loading.

pub mod audio;
pub mod config;
pub mod logging;
pub mod providers;
pub mod speech;

// Re-export commonly used types
pub use audio::CommandAudioPlayer;
pub use config::{
    ConfigLoader, FileAgentConfig, FileAgentsConfig, FileAudioConfig, FileConfig, FileGameConfig,
    FileGatewayConfig, FileLoggingConfig, FilePlayerConfig, FileProvidersConfig,
    FileSpeechConfig,
};
pub use logging::JsonlConversationLogger;
pub use providers::{OllamaProvider, OpenAiProvider, ProviderSetupError, build_gateway};
pub use speech::{CachedSpeechSynthesizer, ElevenLabsClient, SpeechBackend, SpeechCache};
