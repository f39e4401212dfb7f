//! Human input port.
//!
//! A player character may be driven by a person instead of a model. When such
//! a character has to speak, the runtime posts a single pending request and an
//! adapter (console, WebSocket bridge, ...) answers it.
//!
//! # Built-in Implementations
//!
//! - [`ScriptedInput`] - answers from a fixed list, for tests and demos
//!
//! For interactive use, see `ConsoleHumanInput` in the presentation layer.

use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HumanInputError {
    /// The person (or the session) abandoned the request.
    #[error("Input cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No input request is pending")]
    NoPendingRequest,
}

/// Blocking source of human answers.
pub trait HumanInputPort: Send + Sync {
    /// Show `prompt` to the person playing `speaker` and wait for their reply.
    fn read_input(&self, speaker: &str, prompt: &str) -> Result<String, HumanInputError>;
}

/// Replays canned answers in order, then reports cancellation.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }
}

impl HumanInputPort for ScriptedInput {
    fn read_input(&self, _speaker: &str, _prompt: &str) -> Result<String, HumanInputError> {
        self.answers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .ok_or(HumanInputError::Cancelled)
    }
}
