//! Application layer for tavern
//!
//! This crate contains the turn orchestrator, the job-queue runtime, the model
//! gateway and the port definitions adapters implement. It depends only on the
//! domain layer.

pub mod agent;
pub mod config;
pub mod enforcement;
pub mod gateway;
pub mod ports;
pub mod runtime;
pub mod use_cases;

// Re-export commonly used types
pub use agent::{Agent, AgentError, Responder};
pub use config::{RetryPolicy, SessionParams};
pub use enforcement::{EnforcementRole, Enforcer};
pub use gateway::{AttemptError, GatewayError, ModelGateway};
pub use ports::{
    audio::{AudioPlayer, PlaybackError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    human_input::{HumanInputError, HumanInputPort, ScriptedInput},
    llm_provider::{CompletionRequest, LlmProvider, ProviderError},
    speech::{SpeechError, SpeechSynthesizer},
    turn_observer::{NoObserver, TurnObserver},
};
pub use runtime::{
    GameRuntime, RespondError, RuntimeHandle, RuntimePorts, SpeechPorts,
    human_input::{HumanInputSlot, INPUT_PREFIX, InputRequest, parse_input_message},
};
pub use use_cases::execute_turn::{GameMaster, PlayerCharacter, TurnError, TurnRecord};
pub use use_cases::run_session::RoundReport;
