//! Stage spinner shown while a persona is thinking

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use tavern_domain::Stage;

/// A single spinner for the stage in progress.
///
/// Anything else that writes to the terminal while a stage runs (narration,
/// a human input prompt) goes through [`StageProgress::suspend`] so the
/// spinner line is cleared first and redrawn afterwards.
pub struct StageProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl StageProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn start(&self, stage: Stage, character: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(format!("Stage {}", stage.number()));
        pb.set_message(format!("{} {}", stage.label(), character.dimmed()));
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Some(previous) = self.lock().replace(pb) {
            previous.finish_and_clear();
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = self.lock().take() {
            pb.finish_and_clear();
        }
    }

    /// Run `f` with the spinner hidden.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        let bar = self.lock().clone();
        match bar {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StageProgress {
    fn default() -> Self {
        Self::new()
    }
}
