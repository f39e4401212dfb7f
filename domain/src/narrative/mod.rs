//! Narrative state: the story so far, rounds, effects and turn stages.

pub mod diff;
pub mod effect;
pub mod stage;
pub mod state;

pub use diff::{DiffToken, WordDiff};
pub use effect::EnvironmentalEffect;
pub use stage::Stage;
pub use state::{ActionRecord, GameState, Round, StateIssue, StorySegment};
