//! Model backend settings from TOML (`[providers]` and `[gateway]` sections)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tavern_application::RetryPolicy;

/// OpenAI-compatible chat completion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable holding the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key. Prefer the environment variable.
    pub api_key: Option<String>,
    /// Base URL, without the `/v1` suffix.
    pub base_url: String,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

impl FileOpenAiConfig {
    /// The configured key, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Locally hosted Ollama server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOllamaConfig {
    pub host: String,
}

impl Default for FileOllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
        }
    }
}

/// # Example
///
/// ```toml
/// [providers.openai]
/// base_url = "https://api.openai.com"
/// api_key_env = "OPENAI_API_KEY"
///
/// [providers.ollama]
/// host = "http://gpu-box:11434"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileOpenAiConfig,
    pub ollama: FileOllamaConfig,
}

/// Retry and timeout settings for every model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            timeout_secs: policy.attempt_timeout.as_secs(),
        }
    }
}

impl FileGatewayConfig {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_attempt_timeout(Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults_round_trip_to_policy() {
        assert_eq!(
            FileGatewayConfig::default().to_retry_policy(),
            RetryPolicy::default()
        );
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = FileOpenAiConfig {
            api_key_env: "TAVERN_TEST_UNSET_KEY".into(),
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_missing_api_key() {
        let config = FileOpenAiConfig {
            api_key_env: "TAVERN_TEST_UNSET_KEY".into(),
            api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }
}
