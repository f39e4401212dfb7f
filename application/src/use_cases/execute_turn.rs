//! Execute Turn use case
//!
//! Runs one player's turn through its eight stages:
//!
//! ```text
//! 1. Describe situation   DM        enforced
//! 2. Ask questions        actor
//! 3. Answer questions     DM        enforced
//! 4. Declare intent       actor
//! 5. Party feedback       peers     enforced, generated concurrently
//! 6. Final decision       actor     enforced
//! 7. Assess difficulty    DM        structured
//! 8. Resolve              die + DM  enforced
//! ```
//!
//! Story segments are committed to the [`GameState`] only when the turn
//! completes. A failing stage aborts the turn and nothing is committed.

use crate::agent::{Agent, Responder};
use crate::enforcement::{EnforcementRole, Enforcer};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::turn_observer::{NoObserver, TurnObserver};
use crate::runtime::{RespondError, RuntimeHandle};
use futures::future::try_join_all;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tavern_domain::catalog::{self, persona};
use tavern_domain::{
    ActionRecord, CharacterSheet, DifficultyAssessment, GameState, PercentileDie, RandomDie,
    Resolution, Stage, Task, TaskInputs,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Errors that abort a turn
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("{character}'s turn failed at stage '{stage}': {source}")]
    Stage {
        character: String,
        stage: Stage,
        #[source]
        source: RespondError,
    },

    #[error("Turn cancelled")]
    Cancelled,

    #[error("No player at roster position {0}")]
    InvalidPlayer(usize),
}

impl TurnError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TurnError::Cancelled)
    }
}

/// A member of the party.
#[derive(Debug, Clone)]
pub struct PlayerCharacter {
    pub sheet: CharacterSheet,
    pub responder: Responder,
    /// Voice used when speech is enabled.
    pub voice: Option<String>,
}

impl PlayerCharacter {
    pub fn new(sheet: CharacterSheet, responder: Responder) -> Self {
        Self {
            sheet,
            responder,
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.sheet.name
    }
}

/// Everything said and decided during one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    pub round: u32,
    pub character: String,
    pub situation: String,
    pub questions: String,
    pub answers: String,
    pub intent: String,
    /// `(peer name, feedback)` in roster order.
    pub feedback: Vec<(String, String)>,
    pub decision: String,
    pub assessment: DifficultyAssessment,
    pub resolution: Resolution,
    pub narration: String,
}

impl TurnRecord {
    /// `(speaker, text)` pairs in the order they enter the story.
    pub fn segments(&self) -> Vec<(&str, &str)> {
        let dm = persona::DUNGEON_MASTER;
        let mut segments = vec![
            (dm, self.situation.as_str()),
            (self.character.as_str(), self.questions.as_str()),
            (dm, self.answers.as_str()),
            (self.character.as_str(), self.intent.as_str()),
        ];
        segments.extend(
            self.feedback
                .iter()
                .map(|(peer, text)| (peer.as_str(), text.as_str())),
        );
        segments.push((self.character.as_str(), self.decision.as_str()));
        segments.push((dm, self.narration.as_str()));
        segments
    }
}

/// The turn orchestrator. Owns the game state.
pub struct GameMaster {
    pub(crate) dm: Arc<Agent>,
    pub(crate) dm_voice: Option<String>,
    pub(crate) chronicler: Option<Arc<Agent>>,
    pub(crate) enforcer: Enforcer,
    pub(crate) players: Vec<PlayerCharacter>,
    pub(crate) state: GameState,
    pub(crate) runtime: RuntimeHandle,
    pub(crate) die: Arc<dyn PercentileDie>,
    pub(crate) observer: Arc<dyn TurnObserver>,
    pub(crate) logger: Arc<dyn ConversationLogger>,
    pub(crate) speech_enabled: bool,
    pub(crate) cancel: CancellationToken,
}

impl GameMaster {
    pub fn new(
        dm: Arc<Agent>,
        enforcer: Arc<Agent>,
        players: Vec<PlayerCharacter>,
        state: GameState,
        runtime: RuntimeHandle,
    ) -> Self {
        Self {
            dm,
            dm_voice: None,
            chronicler: None,
            enforcer: Enforcer::new(enforcer, runtime.clone()),
            players,
            state,
            runtime,
            die: Arc::new(RandomDie::from_entropy()),
            observer: Arc::new(NoObserver),
            logger: Arc::new(NoConversationLogger),
            speech_enabled: false,
            cancel: CancellationToken::new(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_dm_voice(mut self, voice: impl Into<String>) -> Self {
        self.dm_voice = Some(voice.into());
        self
    }

    /// Summarize rounds with this agent instead of a plain digest.
    pub fn with_chronicler(mut self, chronicler: Arc<Agent>) -> Self {
        self.chronicler = Some(chronicler);
        self
    }

    pub fn with_die(mut self, die: Arc<dyn PercentileDie>) -> Self {
        self.die = die;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.enforcer = self.enforcer.with_observer(Arc::clone(&observer));
        self.observer = observer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.enforcer = self.enforcer.with_logger(Arc::clone(&logger));
        self.logger = logger;
        self
    }

    pub fn with_speech(mut self, enabled: bool) -> Self {
        self.speech_enabled = enabled;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    // ==================== Accessors ====================

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn players(&self) -> &[PlayerCharacter] {
        &self.players
    }

    // ==================== Turn ====================

    /// Run the turn of the player at `index` in the roster.
    pub async fn execute_turn(&mut self, index: usize) -> Result<TurnRecord, TurnError> {
        let actor = self
            .players
            .get(index)
            .cloned()
            .ok_or(TurnError::InvalidPlayer(index))?;
        let round = self.state.current_round();

        info!(round, character = actor.name(), "Turn started");
        self.observer.on_turn_start(round, actor.name());

        let record = match self.run_stages(&actor).await {
            Ok(record) => record,
            Err(e) => {
                if !e.is_cancelled() {
                    error!(round, character = actor.name(), error = %e, "Turn aborted");
                }
                self.observer.on_turn_failed(actor.name(), &e.to_string());
                self.logger.log(ConversationEvent::new(
                    "turn_failed",
                    json!({
                        "round": round,
                        "character": actor.name(),
                        "error": e.to_string(),
                    }),
                ));
                return Err(e);
            }
        };

        for (speaker, text) in record.segments() {
            self.state.append_segment(speaker, text);
        }
        self.state.record_turn(ActionRecord {
            character: record.character.clone(),
            attempted: record.decision.clone(),
            difficulty: record.assessment.difficulty,
            resolution: record.resolution,
        });

        info!(
            round,
            character = actor.name(),
            success = record.resolution.success,
            "Turn completed"
        );
        self.observer.on_turn_complete(actor.name());
        Ok(record)
    }

    async fn run_stages(&self, actor: &PlayerCharacter) -> Result<TurnRecord, TurnError> {
        let name = actor.name();
        let story = self.state.story_so_far();
        let sheet = actor.sheet.to_string();
        let base = TaskInputs::new()
            .with("character_name", name)
            .with("the_story_so_far", &story)
            .with("character_sheet", &sheet);

        // 1. Describe situation
        let situation_task = if self.state.is_first_turn() {
            catalog::DESCRIBE_INITIAL_SITUATION
        } else {
            catalog::DESCRIBE_SITUATION
        };
        let situation = self
            .stage(
                Stage::DescribeSituation,
                name,
                self.narrate(
                    situation_task,
                    base.clone()
                        .with("other_characters", self.describe_party(name)),
                ),
            )
            .await?;

        // 2. Ask questions
        let questions = self
            .stage(
                Stage::AskQuestions,
                name,
                self.player_says(
                    actor,
                    catalog::ASK_QUESTIONS,
                    base.clone().with("what_the_dm_just_told_you", &situation),
                    false,
                ),
            )
            .await?;

        // 3. Answer questions
        let answers = self
            .stage(
                Stage::AnswerQuestions,
                name,
                self.narrate(
                    catalog::ANSWER_QUESTIONS,
                    base.clone()
                        .with("what_you_just_told_the_player", &situation)
                        .with("questions", &questions),
                ),
            )
            .await?;

        // 4. Declare intent
        let intent = self
            .stage(
                Stage::DeclareIntent,
                name,
                self.player_says(
                    actor,
                    catalog::DECLARE_INTENT,
                    base.clone()
                        .with("what_the_dm_just_told_you", &situation)
                        .with("player_questions", &questions)
                        .with("dm_answers", &answers),
                    false,
                ),
            )
            .await?;

        // 5. Party feedback
        let peers: Vec<&PlayerCharacter> =
            self.players.iter().filter(|p| p.name() != name).collect();
        let requests = peers.iter().map(|peer| {
            let inputs = TaskInputs::new()
                .with("other_character_name", peer.name())
                .with("the_story_so_far", &story)
                .with("what_the_dm_just_told_you", &situation)
                .with("other_character_sheet", &peer.sheet)
                .with("acting_character_name", name)
                .with("intended_action", &intent);
            async move {
                let reply = self
                    .player_says(peer, catalog::PROVIDE_FEEDBACK, inputs, true)
                    .await?;
                self.observer.on_stage_complete(Stage::PeerFeedback);
                Ok::<_, RespondError>(reply)
            }
        });
        // Each peer reports its own completion.
        let replies = self
            .await_stage(Stage::PeerFeedback, name, try_join_all(requests))
            .await?;
        let feedback: Vec<(String, String)> = peers
            .iter()
            .map(|peer| peer.name().to_string())
            .zip(replies)
            .collect();

        // 6. Final decision
        let party_feedback = if feedback.is_empty() {
            "Nobody else is here to weigh in.".to_string()
        } else {
            feedback
                .iter()
                .map(|(peer, text)| format!("{peer}: {text}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let decision = self
            .stage(
                Stage::FinalDecision,
                name,
                self.player_says(
                    actor,
                    catalog::MAKE_DECISION,
                    base.clone()
                        .with("what_the_dm_just_told_you", &answers)
                        .with("intended_action", &intent)
                        .with("party_feedback", &party_feedback),
                    true,
                ),
            )
            .await?;

        // 7. Assess difficulty
        let assessment = self
            .stage(
                Stage::AssessDifficulty,
                name,
                self.assess(
                    base.clone()
                        .with("what_you_just_told_the_player", &answers)
                        .with("proposed_action", &decision),
                ),
            )
            .await?;

        // 8. Resolve
        let resolution = Resolution::resolve(assessment.difficulty, self.die.roll());
        self.observer.on_resolution(name, &assessment, &resolution);
        self.logger.log(ConversationEvent::new(
            "resolution",
            json!({
                "round": self.state.current_round(),
                "character": name,
                "difficulty": assessment.difficulty,
                "reasoning": assessment.reasoning,
                "roll": resolution.roll,
                "threshold": resolution.threshold,
                "success": resolution.success,
            }),
        ));
        let narration = self
            .stage(
                Stage::Resolve,
                name,
                self.narrate(
                    catalog::RESOLVE_ACTION,
                    base.with("what_you_just_told_the_player", &answers)
                        .with("proposed_action", &decision)
                        .with("difficulty_assessment", &assessment)
                        .with("roll", resolution.roll)
                        .with("success_threshold", resolution.threshold)
                        .with("did_roll_succeed", resolution.success),
                ),
            )
            .await?;

        Ok(TurnRecord {
            round: self.state.current_round(),
            character: name.to_string(),
            situation,
            questions,
            answers,
            intent,
            feedback,
            decision,
            assessment,
            resolution,
            narration,
        })
    }

    /// Await one stage, racing session cancellation.
    async fn stage<T>(
        &self,
        stage: Stage,
        character: &str,
        work: impl Future<Output = Result<T, RespondError>>,
    ) -> Result<T, TurnError> {
        let value = self.await_stage(stage, character, work).await?;
        self.observer.on_stage_complete(stage);
        Ok(value)
    }

    /// [`Self::stage`] for work that reports its own completions.
    async fn await_stage<T>(
        &self,
        stage: Stage,
        character: &str,
        work: impl Future<Output = Result<T, RespondError>>,
    ) -> Result<T, TurnError> {
        self.observer.on_stage_start(stage, character);
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(TurnError::Cancelled),
            result = work => result,
        };
        result.map_err(|source| TurnError::Stage {
            character: character.to_string(),
            stage,
            source,
        })
    }

    /// DM speaks: generate, enforce, announce.
    async fn narrate(&self, task: Task, inputs: TaskInputs) -> Result<String, RespondError> {
        let raw = self.runtime.submit(&self.dm, task, inputs).await?.into_text();
        let text = self
            .enforcer
            .enforce(EnforcementRole::Narrator, persona::DUNGEON_MASTER, &raw)
            .await?;
        self.announce(persona::DUNGEON_MASTER, &text, self.dm_voice.as_deref(), true);
        Ok(text)
    }

    /// A player speaks, optionally through the enforcer. Only enforced
    /// utterances are narrated aloud.
    async fn player_says(
        &self,
        player: &PlayerCharacter,
        task: Task,
        inputs: TaskInputs,
        enforce: bool,
    ) -> Result<String, RespondError> {
        let raw = self
            .runtime
            .respond(&player.responder, task, inputs)
            .await?
            .into_text();
        let text = if enforce {
            self.enforcer
                .enforce(EnforcementRole::Player, player.name(), &raw)
                .await?
        } else {
            raw
        };
        self.announce(player.name(), &text, player.voice.as_deref(), enforce);
        Ok(text)
    }

    async fn assess(&self, inputs: TaskInputs) -> Result<DifficultyAssessment, RespondError> {
        let output = self
            .runtime
            .submit(&self.dm, catalog::ASSESS_DIFFICULTY, inputs)
            .await?;
        Ok(output.parse()?)
    }

    fn announce(&self, speaker: &str, text: &str, voice: Option<&str>, speak: bool) {
        self.observer.on_utterance(speaker, text);
        self.logger.log(ConversationEvent::new(
            "utterance",
            json!({
                "round": self.state.current_round(),
                "speaker": speaker,
                "text": text,
            }),
        ));
        if speak
            && self.speech_enabled
            && let Some(voice) = voice
        {
            self.runtime.speak(text, voice);
        }
    }

    /// Sheets of everyone except `acting`.
    pub(crate) fn describe_party(&self, acting: &str) -> String {
        let others: Vec<String> = self
            .players
            .iter()
            .filter(|p| p.name() != acting)
            .map(|p| p.sheet.to_string())
            .collect();
        if others.is_empty() {
            "None. The character is alone.".to_string()
        } else {
            others.join("\n")
        }
    }
}
