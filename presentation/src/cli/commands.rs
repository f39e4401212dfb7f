//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for tavern
#[derive(Parser, Debug)]
#[command(name = "tavern")]
#[command(author, version, about = "A tabletop adventure played by language-model personas")]
#[command(long_about = r#"
Tavern runs a turn-based tabletop session. A Dungeon Master, a party of player
characters and an Enforcer are each played by a language model (or, for one
character, by you).

Every player's turn has eight stages:
1. The DM describes the situation
2. The player asks questions
3. The DM answers
4. The player declares an intent
5. The rest of the party reacts
6. The player commits to a final action
7. The DM rates the difficulty
8. A percentile roll is made and the DM narrates the outcome

Configuration files are loaded from (in priority order):
1. TAVERN_* environment variables (nested keys use __)
2. --config <path>     Explicit config file
3. ./tavern.toml       Project-level config
4. ~/.config/tavern/config.toml   Global config

Example:
  tavern --rounds 3
  tavern --story "A storm traps the party in a lighthouse." --seed 7
  tavern --speak --transcript session.jsonl
"#)]
pub struct Cli {
    /// Opening scenario for the Dungeon Master
    #[arg(long, value_name = "TEXT", conflicts_with = "story_file")]
    pub story: Option<String>,

    /// Read the opening scenario from a file
    #[arg(long, value_name = "PATH")]
    pub story_file: Option<PathBuf>,

    /// Number of rounds to play
    #[arg(short, long, value_name = "N")]
    pub rounds: Option<u32>,

    /// Narrate enforced utterances aloud
    #[arg(long, overrides_with = "no_speech")]
    pub speak: bool,

    /// Disable narration even if the config enables it
    #[arg(long)]
    pub no_speech: bool,

    /// Seed for the percentile die
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Let the Chronicler summarize each round
    #[arg(long, overrides_with = "no_chronicle")]
    pub chronicle: bool,

    /// Summarize rounds with a plain digest instead of the Chronicler
    #[arg(long)]
    pub no_chronicle: bool,

    /// Write a JSONL transcript of the session
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators and enforcement diffs
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Speech override from the command line, if any.
    pub fn speech_override(&self) -> Option<bool> {
        match (self.speak, self.no_speech) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn chronicle_override(&self) -> Option<bool> {
        match (self.chronicle, self.no_chronicle) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
