//! Prompt domain
//!
//! Task templates, their inputs and output schemas, plus the built-in catalog
//! of personas and tasks used during a session.

pub mod catalog;
pub mod inputs;
pub mod schema;
pub mod template;

pub use inputs::TaskInputs;
pub use schema::{AgentOutput, OutputSchema, validate_as};
pub use template::Task;
