//! Live console narration of a session

use super::console::ConsoleFormatter;
use crate::progress::reporter::StageProgress;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tavern_application::TurnObserver;
use tavern_domain::{DifficultyAssessment, Resolution, Stage, WordDiff};

/// [`TurnObserver`] that prints the story to the terminal as it is told.
pub struct ConsoleNarrator {
    out: Mutex<Box<dyn Write + Send>>,
    progress: Option<Arc<StageProgress>>,
    show_diffs: bool,
}

impl ConsoleNarrator {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            progress: None,
            show_diffs: true,
        }
    }

    /// Show a spinner while each stage runs.
    pub fn with_progress(mut self, progress: Arc<StageProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Print the Enforcer's word diff whenever it changed something.
    pub fn with_diffs(mut self, show: bool) -> Self {
        self.show_diffs = show;
        self
    }

    fn emit(&self, text: String) {
        let write = || {
            let mut out = self
                .out
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        };
        match &self.progress {
            Some(progress) => progress.suspend(write),
            None => write(),
        }
    }
}

impl Default for ConsoleNarrator {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnObserver for ConsoleNarrator {
    fn on_round_start(&self, round: u32) {
        self.emit(ConsoleFormatter::round_header(round));
    }

    fn on_turn_start(&self, _round: u32, character: &str) {
        self.emit(ConsoleFormatter::turn_header(character));
    }

    fn on_stage_start(&self, stage: Stage, character: &str) {
        if let Some(progress) = &self.progress {
            progress.start(stage, character);
        }
    }

    fn on_stage_complete(&self, _stage: Stage) {
        if let Some(progress) = &self.progress {
            progress.finish();
        }
    }

    fn on_utterance(&self, speaker: &str, text: &str) {
        self.emit(ConsoleFormatter::utterance(speaker, text));
    }

    fn on_enforcement(&self, speaker: &str, diff: &WordDiff) {
        if self.show_diffs && !diff.is_unchanged() {
            self.emit(ConsoleFormatter::enforcement(speaker, diff));
        }
    }

    fn on_resolution(
        &self,
        character: &str,
        assessment: &DifficultyAssessment,
        resolution: &Resolution,
    ) {
        self.emit(ConsoleFormatter::resolution(character, assessment, resolution));
    }

    fn on_turn_failed(&self, character: &str, error: &str) {
        if let Some(progress) = &self.progress {
            progress.finish();
        }
        self.emit(ConsoleFormatter::failure(character, error));
    }

    fn on_round_complete(&self, round: u32, summary: &str) {
        self.emit(ConsoleFormatter::summary(round, summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn narrator() -> (ConsoleNarrator, Capture) {
        colored::control::set_override(false);
        let capture = Capture::default();
        (ConsoleNarrator::with_writer(Box::new(capture.clone())), capture)
    }

    #[test]
    fn test_utterances_are_printed_in_order() {
        let (narrator, capture) = narrator();
        narrator.on_round_start(1);
        narrator.on_turn_start(1, "Eldara");
        narrator.on_utterance("Dungeon Master", "Mist fills the crypt.");
        narrator.on_utterance("Eldara", "I light a torch.");

        let text = capture.text();
        let round = text.find("Round 1").unwrap();
        let turn = text.find("Eldara's turn").unwrap();
        let dm = text.find("Dungeon Master:\n  Mist fills the crypt.").unwrap();
        let eldara = text.find("Eldara:\n  I light a torch.").unwrap();
        assert!(round < turn && turn < dm && dm < eldara);
    }

    #[test]
    fn test_unchanged_enforcement_is_silent() {
        let (narrator, capture) = narrator();
        narrator.on_enforcement("Brussae", &WordDiff::between("I pray.", "I pray."));
        assert!(capture.text().is_empty());

        narrator.on_enforcement("Brussae", &WordDiff::between("I smite all", "I pray"));
        assert!(capture.text().contains("Enforcer edited Brussae"));
    }

    #[test]
    fn test_diffs_can_be_hidden() {
        let (narrator, capture) = narrator();
        let narrator = narrator.with_diffs(false);
        narrator.on_enforcement("Brussae", &WordDiff::between("I smite all", "I pray"));
        assert!(capture.text().is_empty());
    }

    #[test]
    fn test_round_summary_and_failure() {
        let (narrator, capture) = narrator();
        narrator.on_round_complete(2, "The party escaped.");
        narrator.on_turn_failed("Shadowstep", "model unavailable");
        let text = capture.text();
        assert!(text.contains("Round 2 summary\n  The party escaped."));
        assert!(text.contains("Turn aborted Shadowstep: model unavailable"));
    }

    #[test]
    fn test_printing_through_spinner() {
        let (narrator, capture) = narrator();
        let progress = Arc::new(StageProgress::new());
        let narrator = narrator.with_progress(Arc::clone(&progress));
        narrator.on_stage_start(Stage::DeclareIntent, "Eldara");
        narrator.on_utterance("Eldara", "I read the runes.");
        narrator.on_stage_complete(Stage::DeclareIntent);
        assert!(capture.text().contains("I read the runes."));
    }
}
