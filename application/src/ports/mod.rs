//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod audio;
pub mod conversation_logger;
pub mod human_input;
pub mod llm_provider;
pub mod speech;
pub mod turn_observer;
