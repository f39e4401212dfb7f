//! LLM provider port
//!
//! Defines the interface for a single model backend. The
//! [`ModelGateway`](crate::gateway::ModelGateway) selects a provider by
//! [`ProviderKind`] and adds retry, timeout and schema validation on top.

use async_trait::async_trait;
use serde_json::Value;
use tavern_domain::{OutputSchema, ProviderKind};
use thiserror::Error;

/// Errors a provider can report for a single request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider '{0}' does not support structured output")]
    StructuredOutputUnsupported(ProviderKind),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl ProviderError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ProviderError::StructuredOutputUnsupported(_) | ProviderError::MissingCredentials(_)
        )
    }
}

/// One completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub temperature: f32,
}

/// A model backend
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Free-text completion.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError>;

    /// Completion constrained to the JSON object described by `schema`.
    ///
    /// The default refuses; backends with native structured output override it.
    async fn complete_structured(
        &self,
        request: &CompletionRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        let _ = (request, schema);
        Err(ProviderError::StructuredOutputUnsupported(self.kind()))
    }

    fn supports_structured_output(&self) -> bool {
        self.kind().supports_structured_output()
    }
}
