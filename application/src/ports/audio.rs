//! Audio playback port.
//!
//! Playback blocks until the clip has finished. The runtime calls it from a
//! blocking thread and never issues two calls at once.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to start audio player: {0}")]
    Spawn(String),

    #[error("Audio player exited with {0}")]
    Failed(String),
}

pub trait AudioPlayer: Send + Sync {
    fn play(&self, path: &Path) -> Result<(), PlaybackError>;
}
