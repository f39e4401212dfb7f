//! Model-call gateway
//!
//! Routes a call to the provider named by the [`ModelSpec`], retries failed
//! attempts with exponential backoff and validates structured results against
//! the task's [`OutputSchema`].

use crate::config::RetryPolicy;
use crate::ports::llm_provider::{CompletionRequest, LlmProvider, ProviderError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tavern_domain::{AgentOutput, ModelSpec, OutputSchema, ProviderKind, preview};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Response does not match schema '{schema}': {reason}")]
    SchemaMismatch { schema: &'static str, reason: String },
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Provider(e) => e.is_retryable(),
            AttemptError::Timeout(_) | AttemptError::SchemaMismatch { .. } => true,
        }
    }
}

/// Errors returned by [`ModelGateway::call`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("No provider configured for '{0}'")]
    ProviderNotConfigured(ProviderKind),

    #[error("Provider '{provider}' cannot produce structured output for '{schema}'")]
    StructuredOutputUnsupported {
        provider: ProviderKind,
        schema: &'static str,
    },

    #[error("Model call to {model} failed after {attempts} attempt(s): {source}")]
    ModelCall {
        model: String,
        attempts: u32,
        #[source]
        source: AttemptError,
    },
}

impl GatewayError {
    /// Errors caused by configuration rather than by the backend.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GatewayError::ProviderNotConfigured(_)
                | GatewayError::StructuredOutputUnsupported { .. }
        )
    }
}

/// Stateless dispatcher over the configured providers.
pub struct ModelGateway {
    providers: HashMap<ProviderKind, Arc<dyn LlmProvider>>,
    retry: RetryPolicy,
}

impl Default for ModelGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelGateway {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Register a provider, replacing any earlier one of the same kind.
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Startup check that a persona's model can be served.
    pub fn ensure_supported(&self, spec: &ModelSpec) -> Result<(), GatewayError> {
        if self.has_provider(spec.provider()) {
            Ok(())
        } else {
            Err(GatewayError::ProviderNotConfigured(spec.provider()))
        }
    }

    /// Run one model call with retries.
    ///
    /// With a schema the result is [`AgentOutput::Structured`] and has already
    /// passed the schema's validator.
    pub async fn call(
        &self,
        spec: &ModelSpec,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        schema: Option<&OutputSchema>,
    ) -> Result<AgentOutput, GatewayError> {
        let provider = self
            .providers
            .get(&spec.provider())
            .ok_or(GatewayError::ProviderNotConfigured(spec.provider()))?;

        if let Some(schema) = schema
            && !provider.supports_structured_output()
        {
            return Err(GatewayError::StructuredOutputUnsupported {
                provider: spec.provider(),
                schema: schema.name,
            });
        }

        let request = CompletionRequest {
            model: spec.model(),
            system_prompt,
            user_prompt,
            temperature,
        };
        debug!(model = %spec, prompt = %preview(user_prompt, 120), "Calling model");

        let max_attempts = self.retry.attempts();
        let mut attempt = 0;
        loop {
            match self.attempt(provider.as_ref(), &request, schema).await {
                Ok(output) => {
                    if attempt > 0 {
                        debug!(model = %spec, attempts = attempt + 1, "Model call recovered");
                    }
                    return Ok(output);
                }
                Err(err) if !err.is_retryable() || attempt + 1 >= max_attempts => {
                    return Err(match err {
                        AttemptError::Provider(ProviderError::StructuredOutputUnsupported(
                            provider,
                        )) => GatewayError::StructuredOutputUnsupported {
                            provider,
                            schema: schema.map(|s| s.name).unwrap_or_default(),
                        },
                        source => GatewayError::ModelCall {
                            model: spec.to_string(),
                            attempts: attempt + 1,
                            source,
                        },
                    });
                }
                Err(err) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        model = %spec,
                        attempt = attempt + 1,
                        max_attempts,
                        error = %err,
                        "Model call failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        provider: &dyn LlmProvider,
        request: &CompletionRequest<'_>,
        schema: Option<&OutputSchema>,
    ) -> Result<AgentOutput, AttemptError> {
        let limit = self.retry.attempt_timeout;
        match schema {
            None => {
                let text = tokio::time::timeout(limit, provider.complete(request))
                    .await
                    .map_err(|_| AttemptError::Timeout(limit))??;
                Ok(AgentOutput::Text(text.trim().to_string()))
            }
            Some(schema) => {
                let value =
                    tokio::time::timeout(limit, provider.complete_structured(request, schema))
                        .await
                        .map_err(|_| AttemptError::Timeout(limit))??;
                schema
                    .validate(&value)
                    .map_err(|reason| AttemptError::SchemaMismatch {
                        schema: schema.name,
                        reason,
                    })?;
                Ok(AgentOutput::Structured(value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tavern_domain::{DIFFICULTY_SCHEMA, DifficultyAssessment, DifficultyTier};

    /// Fails the first `failures` calls, then answers.
    struct FlakyProvider {
        kind: ProviderKind,
        failures: u32,
        calls: AtomicU32,
        structured: Mutex<Vec<Value>>,
    }

    impl FlakyProvider {
        fn new(kind: ProviderKind, failures: u32) -> Arc<Self> {
            Arc::new(Self {
                kind,
                failures,
                calls: AtomicU32::new(0),
                structured: Mutex::new(Vec::new()),
            })
        }

        fn returning(values: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                kind: ProviderKind::OpenAi,
                failures: 0,
                calls: AtomicU32::new(0),
                structured: Mutex::new(values),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn tick(&self) -> Result<(), ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(ProviderError::Connection(format!("refused #{n}")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            self.tick()?;
            Ok(format!("  echo: {}  ", request.user_prompt))
        }

        async fn complete_structured(
            &self,
            _request: &CompletionRequest<'_>,
            _schema: &OutputSchema,
        ) -> Result<Value, ProviderError> {
            self.tick()?;
            let mut values = self.structured.lock().unwrap();
            if values.is_empty() {
                Ok(json!({"difficulty": "easy", "reasoning": "fallback"}))
            } else {
                Ok(values.remove(0))
            }
        }
    }

    fn spec(s: &str) -> ModelSpec {
        ModelSpec::parse(s).unwrap()
    }

    fn gateway(provider: Arc<FlakyProvider>, attempts: u32) -> ModelGateway {
        ModelGateway::new()
            .with_provider(provider)
            .with_retry_policy(RetryPolicy::default().with_max_attempts(attempts))
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_call_trims_output() {
        let provider = FlakyProvider::new(ProviderKind::OpenAi, 0);
        let gw = gateway(provider.clone(), 3);
        let out = gw
            .call(&spec("openai|gpt-4o-mini"), "sys", "hello", 0.7, None)
            .await
            .unwrap();
        assert_eq!(out, AgentOutput::Text("echo: hello".into()));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let provider = FlakyProvider::new(ProviderKind::Ollama, 2);
        let gw = gateway(provider.clone(), 3);
        let out = gw
            .call(&spec("ollama|llama3"), "sys", "hi", 0.7, None)
            .await;
        assert!(out.is_ok());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let provider = FlakyProvider::new(ProviderKind::OpenAi, u32::MAX);
        let gw = gateway(provider.clone(), 3);
        let err = gw
            .call(&spec("openai|gpt-4o"), "sys", "hi", 0.7, None)
            .await
            .unwrap_err();
        assert_eq!(provider.calls(), 3);
        match err {
            GatewayError::ModelCall {
                model,
                attempts,
                source,
            } => {
                assert_eq!(model, "openai|gpt-4o");
                assert_eq!(attempts, 3);
                assert_eq!(
                    source,
                    AttemptError::Provider(ProviderError::Connection("refused #2".into()))
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_exponential() {
        let provider = FlakyProvider::new(ProviderKind::OpenAi, u32::MAX);
        let gw = gateway(provider, 3);
        let started = tokio::time::Instant::now();
        let _ = gw.call(&spec("openai|gpt-4o"), "sys", "hi", 0.7, None).await;
        // 1s after the first failure, 2s after the second, none after the last
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfigured_provider_is_not_retried() {
        let provider = FlakyProvider::new(ProviderKind::OpenAi, 0);
        let gw = gateway(provider.clone(), 3);
        let err = gw
            .call(&spec("ollama|mistral"), "sys", "hi", 0.7, None)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::ProviderNotConfigured(ProviderKind::Ollama));
        assert!(err.is_configuration());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_structured_output_on_ollama_fails_immediately() {
        let provider = FlakyProvider::new(ProviderKind::Ollama, 0);
        let gw = gateway(provider.clone(), 3);
        let err = gw
            .call(
                &spec("ollama|llama3"),
                "sys",
                "rate this",
                0.7,
                Some(&DIFFICULTY_SCHEMA),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::StructuredOutputUnsupported {
                provider: ProviderKind::Ollama,
                schema: "difficulty_assessment"
            }
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_mismatch_is_retried() {
        let provider = FlakyProvider::returning(vec![
            json!({"difficulty": "impossible", "reasoning": "?"}),
            json!({"difficulty": "hard", "reasoning": "The door is barred"}),
        ]);
        let gw = gateway(provider.clone(), 3);
        let out = gw
            .call(
                &spec("openai|gpt-4o"),
                "sys",
                "rate this",
                0.2,
                Some(&DIFFICULTY_SCHEMA),
            )
            .await
            .unwrap();
        assert_eq!(provider.calls(), 2);
        let assessment: DifficultyAssessment = out.parse().unwrap();
        assert_eq!(assessment.difficulty, DifficultyTier::Hard);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_failure() {
        struct Stalled;

        #[async_trait]
        impl LlmProvider for Stalled {
            fn kind(&self) -> ProviderKind {
                ProviderKind::OpenAi
            }

            async fn complete(&self, _: &CompletionRequest<'_>) -> Result<String, ProviderError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }

        let gw = ModelGateway::new().with_provider(Arc::new(Stalled)).with_retry_policy(
            RetryPolicy::no_retry().with_attempt_timeout(Duration::from_secs(5)),
        );
        let err = gw
            .call(&spec("openai|gpt-4o"), "sys", "hi", 0.7, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::ModelCall {
                attempts: 1,
                source: AttemptError::Timeout(_),
                ..
            }
        ));
    }
}
