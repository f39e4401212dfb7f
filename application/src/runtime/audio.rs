//! Speech synthesis and playback queues.
//!
//! Speech items are synthesized one at a time and their clips forwarded to
//! the playback queue, so clips play in the order the text was enqueued.
//! Playback is exclusive: one clip at a time on a blocking thread.

use crate::ports::audio::AudioPlayer;
use crate::ports::speech::SpeechSynthesizer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Utterance {
    pub text: String,
    pub voice: String,
}

/// Items are clip paths. `None` stops the worker once everything before it
/// has played.
pub(crate) fn spawn_playback_worker(
    player: Arc<dyn AudioPlayer>,
    gap: Duration,
) -> (mpsc::UnboundedSender<Option<PathBuf>>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Option<PathBuf>>();

    let worker = tokio::spawn(async move {
        while let Some(Some(path)) = rx.recv().await {
            let player = Arc::clone(&player);
            let clip = path.clone();
            match tokio::task::spawn_blocking(move || player.play(&clip)).await {
                Ok(Ok(())) => debug!(path = %path.display(), "Played clip"),
                Ok(Err(e)) => warn!(path = %path.display(), error = %e, "Playback failed, skipping"),
                Err(e) => warn!(path = %path.display(), error = %e, "Playback task panicked"),
            }
            tokio::time::sleep(gap).await;
        }
        debug!("Playback worker stopped");
    });

    (tx, worker)
}

/// Items are utterances. `None` stops the worker once everything before it
/// has been handed to playback.
pub(crate) fn spawn_speech_worker(
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: mpsc::UnboundedSender<Option<PathBuf>>,
) -> (mpsc::UnboundedSender<Option<Utterance>>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Option<Utterance>>();

    let worker = tokio::spawn(async move {
        while let Some(Some(utterance)) = rx.recv().await {
            match synthesizer
                .synthesize(&utterance.text, &utterance.voice)
                .await
            {
                Ok(path) => {
                    if playback.send(Some(path)).is_err() {
                        warn!("Playback queue closed, dropping clip");
                    }
                }
                Err(e) => warn!(voice = %utterance.voice, error = %e, "Speech synthesis failed, skipping"),
            }
        }
        debug!("Speech worker stopped");
    });

    (tx, worker)
}
