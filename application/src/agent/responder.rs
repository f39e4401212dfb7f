//! Who answers for a character.

use super::persona::Agent;
use crate::gateway::ModelGateway;
use std::sync::Arc;
use tavern_domain::Controller;

/// Produces a character's utterances.
///
/// The variant is fixed when the roster is built, so the turn logic never
/// inspects model names.
#[derive(Debug, Clone)]
pub enum Responder {
    Model(Arc<Agent>),
    Human { name: String },
}

impl Responder {
    /// Build the responder for a configured [`Controller`].
    pub fn for_controller(
        name: impl Into<String>,
        controller: &Controller,
        system_prompt: impl Into<String>,
        temperature: f32,
        gateway: &Arc<ModelGateway>,
    ) -> Self {
        match controller {
            Controller::Human => Responder::Human { name: name.into() },
            Controller::Model(spec) => Responder::Model(Arc::new(
                Agent::new(name, system_prompt, spec.clone(), Arc::clone(gateway))
                    .with_temperature(temperature),
            )),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Responder::Model(agent) => agent.name(),
            Responder::Human { name } => name,
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Responder::Human { .. })
    }
}
