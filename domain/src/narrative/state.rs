//! Game state owned by the game master.
//!
//! The state is append-only: story segments and action records accumulate,
//! and [`GameState::close_round`] adds one summary per round before the next
//! one begins. Closed rounds stay in the story unless a summary lookback is
//! set, in which case only the most recent summaries stand in for them.

use super::effect::EnvironmentalEffect;
use crate::rules::difficulty::{DifficultyTier, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// One utterance committed to the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySegment {
    pub round: u32,
    pub speaker: String,
    pub text: String,
}

impl fmt::Display for StorySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:\n{}", self.speaker.to_uppercase(), self.text)
    }
}

/// What a character attempted and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub character: String,
    pub attempted: String,
    pub difficulty: DifficultyTier,
    pub resolution: Resolution,
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attempted: {}\nDifficulty: {}\nRoll: {} (needed {} or less)\nResult: {}",
            self.attempted,
            self.difficulty,
            self.resolution.roll,
            self.resolution.threshold,
            if self.resolution.success {
                "success"
            } else {
                "failure"
            }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub turns_taken: Vec<String>,
    pub actions: Vec<ActionRecord>,
}

impl Round {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Deterministic digest of the round's outcomes.
    pub fn digest(&self) -> String {
        if self.actions.is_empty() {
            return format!("Round {}: nothing of note happened.", self.number);
        }
        let mut out = format!("Round {}:", self.number);
        for action in &self.actions {
            out.push_str(&format!(
                "\n- {} attempted {} ({}, rolled {}: {})",
                action.character,
                action.attempted.trim(),
                action.difficulty,
                action.resolution.roll,
                if action.resolution.success {
                    "success"
                } else {
                    "failure"
                }
            ));
        }
        out
    }
}

/// A consistency problem found by [`GameState::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateIssue {
    SummaryCountMismatch { summaries: usize, round: u32 },
    DuplicateTurn { character: String },
    FutureEffect { name: String },
}

impl fmt::Display for StateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateIssue::SummaryCountMismatch { summaries, round } => write!(
                f,
                "{summaries} round summaries recorded but the game is in round {round}"
            ),
            StateIssue::DuplicateTurn { character } => {
                write!(f, "{character} acted more than once this round")
            }
            StateIssue::FutureEffect { name } => {
                write!(f, "effect '{name}' starts in a future round")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    initial_situation: String,
    segments: Vec<StorySegment>,
    round: Round,
    round_summaries: Vec<String>,
    last_actions: BTreeMap<String, String>,
    effects: Vec<EnvironmentalEffect>,
    turns_completed: usize,
    summary_lookback: Option<usize>,
}

impl GameState {
    pub fn new(initial_situation: impl Into<String>) -> Self {
        Self {
            initial_situation: initial_situation.into(),
            segments: Vec::new(),
            round: Round::new(1),
            round_summaries: Vec::new(),
            last_actions: BTreeMap::new(),
            effects: Vec::new(),
            turns_completed: 0,
            summary_lookback: None,
        }
    }

    /// Replace closed rounds in [`Self::story_so_far`] with their summaries,
    /// keeping only the last `rounds` of them.
    pub fn with_summary_lookback(mut self, rounds: usize) -> Self {
        self.summary_lookback = Some(rounds);
        self
    }

    pub fn summary_lookback(&self) -> Option<usize> {
        self.summary_lookback
    }

    pub fn initial_situation(&self) -> &str {
        &self.initial_situation
    }

    pub fn current_round(&self) -> u32 {
        self.round.number
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_summaries(&self) -> &[String] {
        &self.round_summaries
    }

    pub fn previous_summary(&self) -> Option<&str> {
        self.round_summaries.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[StorySegment] {
        &self.segments
    }

    pub fn last_action(&self, character: &str) -> Option<&str> {
        self.last_actions.get(character).map(String::as_str)
    }

    pub fn is_first_turn(&self) -> bool {
        self.turns_completed == 0
    }

    pub fn turns_completed(&self) -> usize {
        self.turns_completed
    }

    /// Context handed to every agent: the opening, everything said so far
    /// with each closed round followed by its summary, and any active effects.
    ///
    /// With a summary lookback, closed rounds appear only as their most recent
    /// summaries.
    pub fn story_so_far(&self) -> String {
        let mut out = format!("Initial situation:\n{}", self.initial_situation);
        match self.summary_lookback {
            None => {
                let mut summaries = self.round_summaries.iter().zip(1u32..).peekable();
                for segment in &self.segments {
                    while let Some((summary, _)) =
                        summaries.next_if(|(_, round)| *round < segment.round)
                    {
                        push_block(&mut out, summary);
                    }
                    push_block(&mut out, &segment.to_string());
                }
                for (summary, _) in summaries {
                    push_block(&mut out, summary);
                }
            }
            Some(lookback) => {
                let skip = self.round_summaries.len().saturating_sub(lookback);
                for summary in &self.round_summaries[skip..] {
                    push_block(&mut out, summary);
                }
                for segment in self.current_round_segments() {
                    push_block(&mut out, &segment.to_string());
                }
            }
        }

        let active: Vec<_> = self.active_effects().collect();
        if !active.is_empty() {
            out.push_str("\n\nOngoing effects:");
            for effect in active {
                out.push_str(&format!("\n- {effect}"));
            }
        }
        out
    }

    /// Segments spoken during the current round, joined for summarizing.
    pub fn round_events(&self) -> String {
        self.current_round_segments()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn current_round_segments(&self) -> impl Iterator<Item = &StorySegment> {
        let round = self.round.number;
        self.segments.iter().filter(move |s| s.round == round)
    }

    pub fn append_segment(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.segments.push(StorySegment {
            round: self.round.number,
            speaker: speaker.into(),
            text: text.into(),
        });
    }

    /// Record a completed turn.
    pub fn record_turn(&mut self, action: ActionRecord) {
        self.last_actions
            .insert(action.character.clone(), action.attempted.clone());
        self.round.turns_taken.push(action.character.clone());
        self.round.actions.push(action);
        self.turns_completed += 1;
    }

    pub fn add_effect(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        duration: Option<u32>,
    ) {
        self.effects.push(EnvironmentalEffect::new(
            name,
            description,
            self.round.number,
            duration,
        ));
    }

    pub fn active_effects(&self) -> impl Iterator<Item = &EnvironmentalEffect> {
        let round = self.round.number;
        self.effects.iter().filter(move |e| e.is_active(round))
    }

    /// Fold the current round into `summary` and start the next one.
    ///
    /// Effects that will not be active in the next round are dropped.
    /// Returns the round that was closed.
    pub fn close_round(&mut self, summary: impl Into<String>) -> Round {
        self.round_summaries.push(summary.into());
        let next = self.round.number + 1;
        self.effects.retain(|e| e.is_active(next));
        std::mem::replace(&mut self.round, Round::new(next))
    }

    pub fn validate(&self) -> Vec<StateIssue> {
        let mut issues = Vec::new();

        if self.round_summaries.len() + 1 != self.round.number as usize {
            issues.push(StateIssue::SummaryCountMismatch {
                summaries: self.round_summaries.len(),
                round: self.round.number,
            });
        }

        let mut seen = HashSet::new();
        for name in &self.round.turns_taken {
            if !seen.insert(name) {
                issues.push(StateIssue::DuplicateTurn {
                    character: name.clone(),
                });
            }
        }

        for effect in &self.effects {
            if effect.started_round > self.round.number {
                issues.push(StateIssue::FutureEffect {
                    name: effect.name.clone(),
                });
            }
        }

        issues
    }
}

fn push_block(out: &mut String, text: &str) {
    out.push_str("\n\n");
    out.push_str(text);
}
