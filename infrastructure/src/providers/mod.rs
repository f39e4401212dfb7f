//! Model backends and gateway assembly.
//!
//! Only the providers that some configured persona actually uses are built,
//! so a local-only party never needs an OpenAI key.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::{FileGatewayConfig, FileProvidersConfig};
use std::collections::HashSet;
use std::sync::Arc;
use tavern_application::ModelGateway;
use tavern_domain::{ModelSpec, ProviderKind};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderSetupError {
    #[error("Missing API key for {provider}: set {env} or providers.{provider}.api_key")]
    MissingCredentials {
        provider: ProviderKind,
        env: String,
    },
}

/// Build a gateway with a provider for every kind used by `models`.
pub fn build_gateway<'a>(
    providers: &FileProvidersConfig,
    gateway: &FileGatewayConfig,
    models: impl IntoIterator<Item = &'a ModelSpec>,
) -> Result<ModelGateway, ProviderSetupError> {
    let kinds: HashSet<ProviderKind> = models.into_iter().map(ModelSpec::provider).collect();
    let mut built = ModelGateway::new().with_retry_policy(gateway.to_retry_policy());

    if kinds.contains(&ProviderKind::OpenAi) {
        let api_key = providers.openai.resolve_api_key().ok_or_else(|| {
            ProviderSetupError::MissingCredentials {
                provider: ProviderKind::OpenAi,
                env: providers.openai.api_key_env.clone(),
            }
        })?;
        info!(base_url = %providers.openai.base_url, "Using OpenAI-compatible provider");
        built = built.with_provider(Arc::new(OpenAiProvider::new(
            api_key,
            &providers.openai.base_url,
        )));
    }

    if kinds.contains(&ProviderKind::Ollama) {
        info!(host = %providers.ollama.host, "Using Ollama provider");
        built = built.with_provider(Arc::new(OllamaProvider::new(&providers.ollama.host)));
    }

    Ok(built)
}
