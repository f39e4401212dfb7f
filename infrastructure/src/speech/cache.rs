//! Content-addressed clip cache.
//!
//! Clips live once in a shared cache directory as `{voice}_{sha256}.mp3`,
//! keyed on `"{text}_{voice}"`. Every clip used in a session is also copied
//! into the session directory so a finished session can be replayed as a whole.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SpeechCache {
    cache_dir: PathBuf,
    session_dir: PathBuf,
}

impl SpeechCache {
    pub fn new(cache_dir: impl Into<PathBuf>, session_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            session_dir: session_dir.into(),
        }
    }

    /// A session directory named after the current local time, next to the cache.
    pub fn timestamped(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let session_dir = cache_dir
            .parent()
            .unwrap_or(&cache_dir)
            .join("sessions")
            .join(stamp);
        Self::new(cache_dir, session_dir)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn key(text: &str, voice_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{text}_{voice_id}").as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn file_name(text: &str, voice_id: &str) -> String {
        format!("{voice_id}_{}.mp3", Self::key(text, voice_id))
    }

    /// Session copy of a cached clip, if the clip was generated before.
    pub async fn lookup(&self, text: &str, voice_id: &str) -> std::io::Result<Option<PathBuf>> {
        let name = Self::file_name(text, voice_id);
        let cached = self.cache_dir.join(&name);
        if !fs::try_exists(&cached).await? {
            return Ok(None);
        }
        debug!(clip = %name, "Speech cache hit");
        self.copy_to_session(&cached, &name).await.map(Some)
    }

    /// Store a freshly synthesized clip and return its session copy.
    pub async fn store(
        &self,
        text: &str,
        voice_id: &str,
        audio: &[u8],
    ) -> std::io::Result<PathBuf> {
        let name = Self::file_name(text, voice_id);
        fs::create_dir_all(&self.cache_dir).await?;
        let cached = self.cache_dir.join(&name);
        fs::write(&cached, audio).await?;
        debug!(clip = %name, bytes = audio.len(), "Speech clip cached");
        self.copy_to_session(&cached, &name).await
    }

    async fn copy_to_session(&self, cached: &Path, name: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.session_dir).await?;
        let target = self.session_dir.join(name);
        if !fs::try_exists(&target).await? {
            fs::copy(cached, &target).await?;
        }
        Ok(target)
    }
}
