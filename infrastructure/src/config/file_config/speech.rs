//! Narration settings from TOML (`[speech]` and `[audio]` sections)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Text-to-speech service and clip cache.
///
/// # Example
///
/// ```toml
/// [speech]
/// narrator_voice = "N2lVS1w4EtoT3dr4eOWO"
/// cache_dir = "~/.cache/tavern/audio"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSpeechConfig {
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_id: String,
    pub output_format: String,
    /// Shared clip cache. Defaults to the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Where this session's clips are copied. Defaults to a timestamped
    /// directory under `sessions/` next to the cache.
    pub session_dir: Option<PathBuf>,
    /// Voice of the Dungeon Master.
    pub narrator_voice: String,
}

impl Default for FileSpeechConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ELEVENLABS_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.elevenlabs.io".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_22050_32".to_string(),
            cache_dir: None,
            session_dir: None,
            narrator_voice: "N2lVS1w4EtoT3dr4eOWO".to_string(),
        }
    }
}

impl FileSpeechConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn resolve_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("tavern")
                .join("audio")
        })
    }
}

/// External player command. `{path}` in `args` is replaced with the clip;
/// without it the path is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAudioConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Silence between two clips
    pub gap_ms: u64,
}

impl Default for FileAudioConfig {
    fn default() -> Self {
        Self {
            command: "ffplay".to_string(),
            args: ["-nodisp", "-autoexit", "-loglevel", "quiet", "{path}"]
                .map(String::from)
                .to_vec(),
            gap_ms: 100,
        }
    }
}
