//! Scripted table for turn and session tests.

use crate::agent::{Agent, Responder};
use crate::config::RetryPolicy;
use crate::gateway::ModelGateway;
use crate::ports::llm_provider::{CompletionRequest, LlmProvider, ProviderError};
use crate::ports::turn_observer::TurnObserver;
use crate::runtime::RuntimeHandle;
use crate::use_cases::execute_turn::{GameMaster, PlayerCharacter};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tavern_domain::catalog::{self, persona};
use tavern_domain::{
    CharacterSheet, Controller, FixedDie, GameState, ModelSpec, OutputSchema, Personality,
    ProviderKind, Stage, WordDiff,
};

/// Answers every persona with `"<speaker> line <n>"`. The enforcer echoes the
/// passage it is given.
pub(crate) struct ScriptedTable {
    pub calls: Mutex<Vec<(String, String)>>,
    pub fail_when: Option<&'static str>,
    pub tier: &'static str,
}

impl ScriptedTable {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: None,
            tier: "average",
        }
    }

    pub fn failing_when(mut self, marker: &'static str) -> Self {
        self.fail_when = Some(marker);
        self
    }

    /// User prompts sent with `speaker`'s system prompt.
    pub fn prompts_for(&self, speaker: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(who, _)| who == speaker)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    fn speaker(system_prompt: &str) -> String {
        if system_prompt == catalog::DUNGEON_MASTER_SYSTEM {
            "DM".to_string()
        } else if system_prompt == catalog::ENFORCER_SYSTEM {
            "Enforcer".to_string()
        } else if system_prompt == catalog::CHRONICLER_SYSTEM {
            "Chronicler".to_string()
        } else {
            system_prompt
                .trim_start_matches("You are playing ")
                .split(',')
                .next()
                .unwrap_or_default()
                .to_string()
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedTable {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        let speaker = Self::speaker(request.system_prompt);
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((speaker.clone(), request.user_prompt.to_string()));
            calls.len()
        };

        if let Some(marker) = self.fail_when
            && request.user_prompt.contains(marker)
        {
            return Err(ProviderError::Connection("table flipped".into()));
        }

        if speaker == "Enforcer" {
            let passage = request
                .user_prompt
                .split("Passage:\n")
                .nth(1)
                .and_then(|rest| rest.split("\n\nReturn the passage").next())
                .unwrap_or_default();
            return Ok(passage.to_string());
        }
        Ok(format!("{speaker} line {n}"))
    }

    async fn complete_structured(
        &self,
        request: &CompletionRequest<'_>,
        _schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push((
            Self::speaker(request.system_prompt),
            request.user_prompt.to_string(),
        ));
        if let Some(marker) = self.fail_when
            && request.user_prompt.contains(marker)
        {
            return Err(ProviderError::Connection("table flipped".into()));
        }
        Ok(json!({"difficulty": self.tier, "reasoning": "Fair odds"}))
    }
}

/// Records observer callbacks.
#[derive(Default)]
pub(crate) struct Transcript {
    pub stages: Mutex<Vec<Stage>>,
    pub completed: Mutex<Vec<Stage>>,
    pub utterances: Mutex<Vec<String>>,
    pub enforcements: Mutex<Vec<String>>,
    pub summaries: Mutex<Vec<String>>,
}

impl TurnObserver for Transcript {
    fn on_stage_start(&self, stage: Stage, _character: &str) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.completed.lock().unwrap().push(stage);
    }

    fn on_utterance(&self, speaker: &str, _text: &str) {
        self.utterances.lock().unwrap().push(speaker.to_string());
    }

    fn on_enforcement(&self, speaker: &str, _diff: &WordDiff) {
        self.enforcements.lock().unwrap().push(speaker.to_string());
    }

    fn on_round_complete(&self, _round: u32, summary: &str) {
        self.summaries.lock().unwrap().push(summary.to_string());
    }
}

pub(crate) const PARTY: [&str; 3] = ["Brussae", "Shadowstep", "Eldara"];

pub(crate) fn sheet(name: &str) -> CharacterSheet {
    CharacterSheet::new(name, "Adventurer", "Human").with_personality(Personality {
        traits: vec!["Brave".into()],
        ideals: vec!["Honor".into()],
        bonds: vec!["The party".into()],
        flaws: vec!["Reckless".into()],
        quirks: vec![],
    })
}

pub(crate) fn gateway(table: Arc<ScriptedTable>) -> Arc<ModelGateway> {
    Arc::new(
        ModelGateway::new()
            .with_provider(table)
            .with_retry_policy(RetryPolicy::no_retry()),
    )
}

pub(crate) fn spec() -> ModelSpec {
    ModelSpec::parse("openai|gpt-4o-mini").unwrap()
}

pub(crate) fn player(name: &str, controller: &Controller, gateway: &Arc<ModelGateway>) -> PlayerCharacter {
    let sheet = sheet(name);
    let system = catalog::player_system(name, &sheet.to_string());
    PlayerCharacter::new(
        sheet,
        Responder::for_controller(name, controller, system, 0.7, gateway),
    )
    .with_voice(format!("voice-{name}"))
}

pub(crate) fn agent(name: &str, system: &str, gateway: &Arc<ModelGateway>) -> Arc<Agent> {
    Arc::new(Agent::new(name, system, spec(), Arc::clone(gateway)))
}

/// A game master for [`PARTY`], all model-driven, rolling a fixed 50.
pub(crate) fn game_master(table: Arc<ScriptedTable>, runtime: RuntimeHandle) -> GameMaster {
    game_master_with_state(table, runtime, GameState::new("The Crimson Crypt."))
}

pub(crate) fn game_master_with_state(
    table: Arc<ScriptedTable>,
    runtime: RuntimeHandle,
    state: GameState,
) -> GameMaster {
    let gateway = gateway(table);
    let controller = Controller::Model(spec());
    let players = PARTY
        .iter()
        .map(|name| player(name, &controller, &gateway))
        .collect();
    GameMaster::new(
        agent(persona::DUNGEON_MASTER, catalog::DUNGEON_MASTER_SYSTEM, &gateway),
        agent(persona::ENFORCER, catalog::ENFORCER_SYSTEM, &gateway),
        players,
        state,
        runtime,
    )
    .with_die(Arc::new(FixedDie(50)))
}

/// Records played clips.
#[derive(Default)]
pub(crate) struct Tape {
    pub played: Mutex<Vec<std::path::PathBuf>>,
}

impl crate::ports::audio::AudioPlayer for Tape {
    fn play(&self, path: &std::path::Path) -> Result<(), crate::ports::audio::PlaybackError> {
        self.played.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Synthesizes `"<voice>/<text>"` without touching the network.
pub(crate) struct InstantVoice;

#[async_trait]
impl crate::ports::speech::SpeechSynthesizer for InstantVoice {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<std::path::PathBuf, crate::ports::speech::SpeechError> {
        Ok(std::path::PathBuf::from(format!("{voice_id}/{text}")))
    }
}
