//! Speech synthesis adapters.

pub mod cache;
pub mod elevenlabs;

pub use cache::SpeechCache;
pub use elevenlabs::ElevenLabsClient;

use async_trait::async_trait;
use std::path::PathBuf;
use tavern_application::{SpeechError, SpeechSynthesizer};

/// A remote text-to-speech service returning encoded audio.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn fetch(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SpeechError>;
}

/// [`SpeechSynthesizer`] that only calls the backend on a cache miss.
pub struct CachedSpeechSynthesizer<B> {
    backend: B,
    cache: SpeechCache,
}

impl<B: SpeechBackend> CachedSpeechSynthesizer<B> {
    pub fn new(backend: B, cache: SpeechCache) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &SpeechCache {
        &self.cache
    }
}

#[async_trait]
impl<B: SpeechBackend> SpeechSynthesizer for CachedSpeechSynthesizer<B> {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf, SpeechError> {
        if let Some(path) = self.cache.lookup(text, voice_id).await? {
            return Ok(path);
        }
        let audio = self.backend.fetch(text, voice_id).await?;
        Ok(self.cache.store(text, voice_id, &audio).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechBackend for CountingBackend {
        async fn fetch(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{voice_id}:{text}").into_bytes())
        }
    }

    struct DownBackend;

    #[async_trait]
    impl SpeechBackend for DownBackend {
        async fn fetch(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>, SpeechError> {
            Err(SpeechError::Status {
                status: 401,
                body: "invalid api key".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let root = tempfile::tempdir().unwrap();
        let synth = CachedSpeechSynthesizer::new(
            CountingBackend::default(),
            SpeechCache::new(root.path().join("cache"), root.path().join("session")),
        );

        let first = synth.synthesize("The door opens.", "dm").await.unwrap();
        let second = synth.synthesize("The door opens.", "dm").await.unwrap();
        synth.synthesize("The door opens.", "eldara").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(synth.backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read(first).unwrap(), b"dm:The door opens.");
    }

    #[tokio::test]
    async fn test_backend_error_is_not_cached() {
        let root = tempfile::tempdir().unwrap();
        let synth = CachedSpeechSynthesizer::new(
            DownBackend,
            SpeechCache::new(root.path().join("cache"), root.path().join("session")),
        );

        let err = synth.synthesize("Hello", "dm").await.unwrap_err();
        assert!(matches!(err, SpeechError::Status { status: 401, .. }));
        assert!(synth.cache().lookup("Hello", "dm").await.unwrap().is_none());
    }
}
