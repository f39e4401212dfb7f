//! Log destinations from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// # Example
///
/// ```toml
/// [logging]
/// file = "tavern.log"
/// transcript = "sessions/crypt.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Also write diagnostics to this file
    pub file: Option<PathBuf>,
    /// JSONL transcript of the session
    pub transcript: Option<PathBuf>,
}
