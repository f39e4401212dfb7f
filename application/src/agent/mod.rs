//! Model-backed personas and the responders that drive characters.

mod persona;
mod responder;

pub use persona::{Agent, AgentError};
pub use responder::Responder;
