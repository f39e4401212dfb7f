//! Speech synthesis port.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech request failed: {0}")]
    Request(String),

    #[error("Speech service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Speech cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns text into an audio clip on disk.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns the path of a playable clip for `text` spoken by `voice_id`.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf, SpeechError>;
}
