//! Turn observer port
//!
//! Receives notifications as a turn moves through its stages so a front end
//! can render the story live. Every method has an empty default.

use tavern_domain::{DifficultyAssessment, Resolution, Stage, WordDiff};

pub trait TurnObserver: Send + Sync {
    fn on_round_start(&self, _round: u32) {}

    fn on_turn_start(&self, _round: u32, _character: &str) {}

    fn on_stage_start(&self, _stage: Stage, _character: &str) {}

    /// Peer feedback completes once per peer, as each reply is enforced.
    fn on_stage_complete(&self, _stage: Stage) {}

    /// A persona said something that is now part of the story.
    fn on_utterance(&self, _speaker: &str, _text: &str) {}

    /// The enforcer processed `speaker`'s output. Called for unchanged text too.
    fn on_enforcement(&self, _speaker: &str, _diff: &WordDiff) {}

    fn on_resolution(
        &self,
        _character: &str,
        _assessment: &DifficultyAssessment,
        _resolution: &Resolution,
    ) {
    }

    fn on_turn_complete(&self, _character: &str) {}

    fn on_turn_failed(&self, _character: &str, _error: &str) {}

    fn on_round_complete(&self, _round: u32, _summary: &str) {}
}

/// No-op observer
pub struct NoObserver;

impl TurnObserver for NoObserver {}
