//! A model-backed persona.

use crate::gateway::{GatewayError, ModelGateway};
use std::sync::Arc;
use tavern_domain::{AgentOutput, DomainError, ModelSpec, Task, TaskInputs};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The task could not be rendered (missing inputs, bad template).
    #[error(transparent)]
    Input(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// A named persona with a fixed system prompt and model.
///
/// Immutable after construction apart from [`Agent::with_gateway`].
#[derive(Clone)]
pub struct Agent {
    name: String,
    system_prompt: String,
    model: ModelSpec,
    temperature: f32,
    gateway: Arc<ModelGateway>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: ModelSpec,
        gateway: Arc<ModelGateway>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            model,
            temperature: Self::DEFAULT_TEMPERATURE,
            gateway,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Swap the gateway, keeping everything else.
    pub fn with_gateway(mut self, gateway: Arc<ModelGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Render `task` with `inputs` and send it to the model.
    ///
    /// Fails before any model call if an input is missing.
    pub async fn execute_task(
        &self,
        task: &Task,
        inputs: &TaskInputs,
    ) -> Result<AgentOutput, AgentError> {
        let prompt = task.render(inputs)?;
        debug!(agent = %self.name, task = task.name, model = %self.model, "Executing task");

        let output = self
            .gateway
            .call(
                &self.model,
                &self.system_prompt,
                &prompt,
                self.temperature,
                task.schema.as_ref(),
            )
            .await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_provider::{CompletionRequest, LlmProvider, ProviderError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tavern_domain::ProviderKind;

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<(String, String, f32)>>,
    }

    #[async_trait]
    impl LlmProvider for Recorder {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push((
                request.system_prompt.to_string(),
                request.user_prompt.to_string(),
                request.temperature,
            ));
            Ok("Aye.".to_string())
        }
    }

    const HAIL: Task = Task::new("hail", "", "Greet {name} at the {place}.");

    fn agent(recorder: Arc<Recorder>) -> Agent {
        let gateway = Arc::new(ModelGateway::new().with_provider(recorder));
        Agent::new(
            "Innkeeper",
            "You run the Prancing Pony.",
            ModelSpec::parse("openai|gpt-4o-mini").unwrap(),
            gateway,
        )
        .with_temperature(0.3)
    }

    #[tokio::test]
    async fn test_execute_task_renders_prompt() {
        let recorder = Arc::new(Recorder::default());
        let out = agent(recorder.clone())
            .execute_task(
                &HAIL,
                &TaskInputs::new().with("name", "Eldara").with("place", "gate"),
            )
            .await
            .unwrap();

        assert_eq!(out, AgentOutput::Text("Aye.".into()));
        let prompts = recorder.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            (
                "You run the Prancing Pony.".to_string(),
                "Greet Eldara at the gate.".to_string(),
                0.3
            )
        );
    }

    #[tokio::test]
    async fn test_missing_inputs_fail_without_calling_the_model() {
        let recorder = Arc::new(Recorder::default());
        let err = agent(recorder.clone())
            .execute_task(&HAIL, &TaskInputs::new().with("name", "Eldara"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AgentError::Input(DomainError::MissingInputs(vec!["place".into()]))
        );
        assert!(recorder.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_gateway_keeps_identity() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let moved = agent(first.clone())
            .with_gateway(Arc::new(ModelGateway::new().with_provider(second.clone())));
        assert_eq!(moved.name(), "Innkeeper");

        moved
            .execute_task(&HAIL, &TaskInputs::new().with("name", "A").with("place", "B"))
            .await
            .unwrap();
        assert!(first.prompts.lock().unwrap().is_empty());
        assert_eq!(second.prompts.lock().unwrap().len(), 1);
    }
}
