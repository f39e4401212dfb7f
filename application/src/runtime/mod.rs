//! Session runtime: job queues and their workers.
//!
//! [`GameRuntime::start`] spawns one worker per queue:
//!
//! | Queue | Item | Consumer |
//! |-------|------|----------|
//! | LLM | agent, task, inputs, reply slot | runs `Agent::execute_task` |
//! | Speech | text, voice | synthesizes, forwards the clip to playback |
//! | Playback | clip path or `None` | plays clips one at a time |
//!
//! plus, when a [`HumanInputPort`] is supplied, a bridge that answers the
//! [`HumanInputSlot`]. Producers talk to the workers through a cloneable
//! [`RuntimeHandle`]. [`GameRuntime::shutdown`] drains speech and playback
//! before stopping the remaining workers.

mod audio;
pub mod human_input;
mod llm_queue;

use crate::agent::{Agent, AgentError, Responder};
use crate::ports::audio::AudioPlayer;
use crate::ports::human_input::{HumanInputError, HumanInputPort};
use crate::ports::speech::SpeechSynthesizer;
use audio::Utterance;
use human_input::HumanInputSlot;
use llm_queue::LlmJob;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tavern_domain::{AgentOutput, DomainError, Task, TaskInputs};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors returned to producers of runtime jobs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RespondError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Human input failed: {0}")]
    Human(#[from] HumanInputError),

    #[error(transparent)]
    Input(#[from] DomainError),

    #[error("Runtime is not running")]
    RuntimeStopped,
}

/// Adapters needed for narration.
pub struct SpeechPorts {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub player: Arc<dyn AudioPlayer>,
}

/// Adapters and options for [`GameRuntime::start`].
pub struct RuntimePorts {
    /// Enables the speech and playback queues.
    pub speech: Option<SpeechPorts>,
    /// Blocking source of human answers. Without one, answers must arrive
    /// through [`HumanInputSlot::fulfill`].
    pub human_input: Option<Arc<dyn HumanInputPort>>,
    pub playback_gap: Duration,
}

impl Default for RuntimePorts {
    fn default() -> Self {
        Self {
            speech: None,
            human_input: None,
            playback_gap: Duration::from_millis(100),
        }
    }
}

impl RuntimePorts {
    pub fn with_speech(
        mut self,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Arc<dyn AudioPlayer>,
    ) -> Self {
        self.speech = Some(SpeechPorts {
            synthesizer,
            player,
        });
        self
    }

    pub fn with_human_input(mut self, port: Arc<dyn HumanInputPort>) -> Self {
        self.human_input = Some(port);
        self
    }

    pub fn with_playback_gap(mut self, gap: Duration) -> Self {
        self.playback_gap = gap;
        self
    }
}

/// Producer side of the runtime queues.
#[derive(Clone)]
pub struct RuntimeHandle {
    llm: mpsc::UnboundedSender<LlmJob>,
    speech: Option<mpsc::UnboundedSender<Option<Utterance>>>,
    human: Arc<HumanInputSlot>,
}

impl RuntimeHandle {
    /// Enqueue a model job and wait for its result.
    pub async fn submit(
        &self,
        agent: &Arc<Agent>,
        task: Task,
        inputs: TaskInputs,
    ) -> Result<AgentOutput, RespondError> {
        let (reply, result) = oneshot::channel();
        self.llm
            .send(LlmJob {
                agent: Arc::clone(agent),
                task,
                inputs,
                reply,
            })
            .map_err(|_| RespondError::RuntimeStopped)?;

        Ok(result.await.map_err(|_| RespondError::RuntimeStopped)??)
    }

    /// Get an utterance from whoever drives `responder`.
    ///
    /// Model responders go through the LLM queue. Human responders are shown
    /// the rendered task and answer through the input slot.
    pub async fn respond(
        &self,
        responder: &Responder,
        task: Task,
        inputs: TaskInputs,
    ) -> Result<AgentOutput, RespondError> {
        match responder {
            Responder::Model(agent) => self.submit(agent, task, inputs).await,
            Responder::Human { name } => {
                let prompt = task.render(&inputs)?;
                let text = self.human.request(name.clone(), prompt).await?;
                Ok(AgentOutput::Text(text.trim().to_string()))
            }
        }
    }

    /// Queue `text` for narration. Returns false when speech is disabled.
    pub fn speak(&self, text: &str, voice: &str) -> bool {
        let Some(speech) = &self.speech else {
            return false;
        };
        let utterance = Utterance {
            text: text.to_string(),
            voice: voice.to_string(),
        };
        if speech.send(Some(utterance)).is_err() {
            warn!("Speech queue closed, dropping utterance");
            return false;
        }
        true
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech.is_some()
    }

    pub fn human_input(&self) -> &Arc<HumanInputSlot> {
        &self.human
    }
}

/// Owner of the worker tasks.
pub struct GameRuntime {
    handle: RuntimeHandle,
    cancel: CancellationToken,
    llm_worker: JoinHandle<()>,
    human_worker: Option<JoinHandle<()>>,
    speech_worker: Option<JoinHandle<()>>,
    playback: Option<(mpsc::UnboundedSender<Option<PathBuf>>, JoinHandle<()>)>,
}

impl GameRuntime {
    /// Spawn the workers. Must be called inside a Tokio runtime.
    pub fn start(ports: RuntimePorts) -> Self {
        let cancel = CancellationToken::new();
        let (llm, llm_worker) = llm_queue::spawn_llm_worker(cancel.child_token());

        let human = Arc::new(HumanInputSlot::new());
        let human_worker = ports.human_input.map(|port| {
            human_input::spawn_input_bridge(Arc::clone(&human), port, cancel.child_token())
        });

        let (speech, speech_worker, playback) = match ports.speech {
            Some(SpeechPorts {
                synthesizer,
                player,
            }) => {
                let (playback_tx, playback_worker) =
                    audio::spawn_playback_worker(player, ports.playback_gap);
                let (speech_tx, speech_worker) =
                    audio::spawn_speech_worker(synthesizer, playback_tx.clone());
                (
                    Some(speech_tx),
                    Some(speech_worker),
                    Some((playback_tx, playback_worker)),
                )
            }
            None => (None, None, None),
        };

        info!(
            speech = speech.is_some(),
            human_input = human_worker.is_some(),
            "Runtime started"
        );

        Self {
            handle: RuntimeHandle { llm, speech, human },
            cancel,
            llm_worker,
            human_worker,
            speech_worker,
            playback,
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Let queued narration finish, then stop every worker.
    pub async fn shutdown(self) {
        if let Some(speech) = &self.handle.speech {
            let _ = speech.send(None);
        }
        if let Some(worker) = self.speech_worker {
            join("speech", worker).await;
        }
        if let Some((playback, worker)) = self.playback {
            let _ = playback.send(None);
            join("playback", worker).await;
        }

        self.cancel.cancel();
        self.handle.human.cancel_pending();
        join("llm", self.llm_worker).await;
        if let Some(worker) = self.human_worker {
            join("human input", worker).await;
        }
        info!("Runtime stopped");
    }
}

async fn join(name: &str, worker: JoinHandle<()>) {
    match worker.await {
        Ok(()) => debug!(worker = name, "Worker joined"),
        Err(e) => warn!(worker = name, error = %e, "Worker ended abnormally"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ModelGateway;
    use crate::ports::audio::PlaybackError;
    use crate::ports::human_input::ScriptedInput;
    use crate::ports::llm_provider::{CompletionRequest, LlmProvider, ProviderError};
    use crate::ports::speech::SpeechError;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use tavern_domain::{ModelSpec, ProviderKind};

    struct Shout;

    #[async_trait]
    impl LlmProvider for Shout {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Ollama
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            Ok(request.user_prompt.to_uppercase())
        }
    }

    fn agent() -> Arc<Agent> {
        let gateway = Arc::new(ModelGateway::new().with_provider(Arc::new(Shout)));
        Arc::new(Agent::new(
            "Herald",
            "",
            ModelSpec::parse("ollama|llama3").unwrap(),
            gateway,
        ))
    }

    const ANNOUNCE: Task = Task::new("announce", "", "hear ye, {who}");

    #[tokio::test]
    async fn test_submit_round_trips_through_worker() {
        let runtime = GameRuntime::start(RuntimePorts::default());
        let out = runtime
            .handle()
            .submit(&agent(), ANNOUNCE, TaskInputs::new().with("who", "all"))
            .await
            .unwrap();
        assert_eq!(out, AgentOutput::Text("HEAR YE, ALL".into()));
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_worker_survives_failed_job() {
        let runtime = GameRuntime::start(RuntimePorts::default());
        let handle = runtime.handle();

        let err = handle
            .submit(&agent(), ANNOUNCE, TaskInputs::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RespondError::Agent(AgentError::Input(DomainError::MissingInputs(_)))
        ));

        let ok = handle
            .submit(&agent(), ANNOUNCE, TaskInputs::new().with("who", "you"))
            .await;
        assert!(ok.is_ok());
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let runtime = GameRuntime::start(RuntimePorts::default());
        let handle = runtime.handle();
        runtime.shutdown().await;
        let err = handle
            .submit(&agent(), ANNOUNCE, TaskInputs::new().with("who", "x"))
            .await
            .unwrap_err();
        assert_eq!(err, RespondError::RuntimeStopped);
    }

    #[tokio::test]
    async fn test_human_responder_uses_input_slot() {
        let runtime = GameRuntime::start(
            RuntimePorts::default().with_human_input(Arc::new(ScriptedInput::new([
                "  I draw my sword  ",
            ]))),
        );
        let responder = Responder::Human {
            name: "Brussae".into(),
        };
        let out = runtime
            .handle()
            .respond(&responder, ANNOUNCE, TaskInputs::new().with("who", "Brussae"))
            .await
            .unwrap();
        assert_eq!(out, AgentOutput::Text("I draw my sword".into()));
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_human_responder_fails_fast_on_missing_inputs() {
        let runtime = GameRuntime::start(RuntimePorts::default());
        let responder = Responder::Human { name: "B".into() };
        let err = runtime
            .handle()
            .respond(&responder, ANNOUNCE, TaskInputs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RespondError::Input(DomainError::MissingInputs(_))));
        assert!(runtime.handle().human_input().pending_request().is_none());
        runtime.shutdown().await;
    }

    #[derive(Default)]
    struct Tape {
        played: Mutex<Vec<PathBuf>>,
    }

    impl AudioPlayer for Tape {
        fn play(&self, path: &Path) -> Result<(), PlaybackError> {
            self.played.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct Instant;

    #[async_trait]
    impl SpeechSynthesizer for Instant {
        async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf, SpeechError> {
            Ok(PathBuf::from(format!("{voice_id}/{text}")))
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_narration() {
        let tape = Arc::new(Tape::default());
        let runtime = GameRuntime::start(
            RuntimePorts::default()
                .with_speech(Arc::new(Instant), tape.clone())
                .with_playback_gap(Duration::ZERO),
        );
        let handle = runtime.handle();
        assert!(handle.speech_enabled());
        assert!(handle.speak("one", "v"));
        assert!(handle.speak("two", "v"));
        runtime.shutdown().await;

        assert_eq!(
            *tape.played.lock().unwrap(),
            vec![PathBuf::from("v/one"), PathBuf::from("v/two")]
        );
        assert!(!handle.speak("late", "v"));
    }

    #[tokio::test]
    async fn test_speak_without_speech_is_noop() {
        let runtime = GameRuntime::start(RuntimePorts::default());
        assert!(!runtime.handle().speak("hello", "v"));
        runtime.shutdown().await;
    }
}
