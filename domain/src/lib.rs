//! Domain layer for tavern
//!
//! This crate contains the rules and value objects of the tabletop session.
//! It performs no I/O and has no dependencies on the application, infrastructure
//! or presentation layers.
//!
//! # Core Concepts
//!
//! ## Personas
//!
//! A session is played by language-model personas: a Dungeon Master who
//! narrates, player characters who act, an Enforcer who keeps both within the
//! table rules, and a Chronicler who summarizes rounds. Each persona is bound to
//! a [`ModelSpec`] or, for player characters, to a human ([`Controller::Human`]).
//!
//! ## Tasks
//!
//! A [`Task`] is a static template with `{placeholder}` slots. Structured tasks
//! carry an [`OutputSchema`] describing the JSON they must return.
//!
//! ## Turns
//!
//! A player's turn moves through eight [`Stage`]s and ends with a percentile
//! roll checked against the [`DifficultyTier`] threshold.

pub mod character;
pub mod core;
pub mod narrative;
pub mod prompt;
pub mod rules;

// Re-export commonly used types
pub use character::{CharacterSheet, Personality};
pub use core::{
    error::DomainError,
    model::{Controller, ModelSpec, ProviderKind},
    string::preview,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use narrative::{
    ActionRecord, DiffToken, EnvironmentalEffect, GameState, Round, Stage, StateIssue,
    StorySegment, WordDiff,
};
pub use prompt::{AgentOutput, OutputSchema, Task, TaskInputs, catalog, validate_as};
pub use rules::{
    dice::{FixedDie, PercentileDie, RandomDie, roll_percentile},
    difficulty::{DIFFICULTY_SCHEMA, DifficultyAssessment, DifficultyTier, Resolution},
};
