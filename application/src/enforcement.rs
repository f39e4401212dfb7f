//! Enforcement pass
//!
//! Every narrator and player utterance that becomes part of the story is
//! rewritten by the Enforcer persona so it respects the table rules. The word
//! diff between input and output is reported to the observer and transcript
//! but never changes what is returned.

use crate::agent::Agent;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::turn_observer::{NoObserver, TurnObserver};
use crate::runtime::{RespondError, RuntimeHandle};
use serde_json::json;
use std::sync::Arc;
use tavern_domain::{Task, TaskInputs, WordDiff, catalog};
use tracing::debug;

/// Whose output is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementRole {
    Narrator,
    Player,
}

impl EnforcementRole {
    pub fn task(&self) -> Task {
        match self {
            EnforcementRole::Narrator => catalog::ENFORCE_DM,
            EnforcementRole::Player => catalog::ENFORCE_PLAYER,
        }
    }

    pub fn input_key(&self) -> &'static str {
        match self {
            EnforcementRole::Narrator => "dm_output",
            EnforcementRole::Player => "player_output",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementRole::Narrator => "narrator",
            EnforcementRole::Player => "player",
        }
    }
}

#[derive(Clone)]
pub struct Enforcer {
    agent: Arc<Agent>,
    runtime: RuntimeHandle,
    observer: Arc<dyn TurnObserver>,
    logger: Arc<dyn ConversationLogger>,
}

impl Enforcer {
    pub fn new(agent: Arc<Agent>, runtime: RuntimeHandle) -> Self {
        Self {
            agent,
            runtime,
            observer: Arc::new(NoObserver),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Return `raw` rewritten to comply with the rules for `role`.
    ///
    /// Errors from the enforcer call are returned as-is; there is no fallback
    /// to the unedited text.
    pub async fn enforce(
        &self,
        role: EnforcementRole,
        speaker: &str,
        raw: &str,
    ) -> Result<String, RespondError> {
        let inputs = TaskInputs::new().with(role.input_key(), raw);
        let edited = self
            .runtime
            .submit(&self.agent, role.task(), inputs)
            .await?
            .into_text();

        let diff = WordDiff::between(raw, &edited);
        if diff.is_unchanged() {
            debug!(speaker, role = role.as_str(), "Enforcer kept text unchanged");
        } else {
            debug!(
                speaker,
                role = role.as_str(),
                inserted = diff.inserted_words(),
                removed = diff.removed_words(),
                diff = %diff,
                "Enforcer edited text"
            );
        }
        self.observer.on_enforcement(speaker, &diff);
        self.logger.log(ConversationEvent::new(
            "enforcement",
            json!({
                "speaker": speaker,
                "role": role.as_str(),
                "changed": !diff.is_unchanged(),
                "diff": diff.to_string(),
            }),
        ));

        Ok(edited)
    }
}
