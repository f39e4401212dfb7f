//! Session settings from TOML (`[game]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tavern_application::SessionParams;

/// Opening used when neither the command line nor the config provides one.
pub const DEFAULT_INITIAL_SITUATION: &str = "\
The party stands at the entrance of the Crimson Crypt, an ancient tomb recently \
uncovered in the forests north of the city. Local legends speak of powerful magical \
artifacts sealed away here centuries ago. The stone doorway bears mysterious runes, \
and a cold breeze emanates from within. The sun is setting, casting long shadows \
through the trees.

The party has been hired by the Arcane Academy to investigate the tomb and retrieve \
any magical artifacts, especially the rumored Orb of First Light. However, they're \
not the only ones interested in the tomb's contents - they've spotted signs of other \
adventurers in the area.";

/// # Example
///
/// ```toml
/// [game]
/// rounds = 3
/// speech = true
/// chronicle_rounds = false
/// seed = 42
/// summary_lookback = 3
/// initial_situation = "A storm batters the lighthouse..."
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGameConfig {
    pub rounds: u32,
    pub initial_situation: Option<String>,
    /// Narrate enforced utterances aloud
    pub speech: bool,
    /// Let the Chronicler summarize each round instead of a plain digest
    pub chronicle_rounds: bool,
    /// Replace closed rounds in the story context with this many recent
    /// summaries. Unset keeps the whole story.
    pub summary_lookback: Option<usize>,
    /// Seed for the percentile die, for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for FileGameConfig {
    fn default() -> Self {
        let params = SessionParams::default();
        Self {
            rounds: params.rounds,
            initial_situation: None,
            speech: params.speech_enabled,
            chronicle_rounds: params.chronicle_rounds,
            summary_lookback: params.summary_lookback,
            seed: None,
        }
    }
}

impl FileGameConfig {
    pub fn initial_situation(&self) -> &str {
        self.initial_situation
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_INITIAL_SITUATION)
    }

    pub fn to_session_params(&self, playback_gap_ms: u64) -> SessionParams {
        let params = SessionParams::default()
            .with_rounds(self.rounds)
            .with_speech(self.speech)
            .with_chronicle_rounds(self.chronicle_rounds)
            .with_playback_gap(Duration::from_millis(playback_gap_ms));
        match self.summary_lookback {
            Some(rounds) => params.with_summary_lookback(rounds),
            None => params,
        }
    }
}
