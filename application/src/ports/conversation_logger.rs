//! Port for the structured session transcript.
//!
//! Defines the [`ConversationLogger`] trait for recording what happened at the
//! table (utterances, enforcer edits, difficulty ratings, rolls, round
//! summaries) to a machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing carries
//! diagnostics for the operator, the transcript carries the story.

use serde_json::Value;

/// A structured transcript event.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "utterance", "enforcement", "resolution").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging transcript events.
///
/// `log` is synchronous and infallible so a broken log file never interrupts
/// a turn. Implementations swallow their own write errors.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when no transcript is requested.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
