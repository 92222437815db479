//! Model interaction: one prompt in, one completion out.
//!
//! Every step talks to the model through [`CompletionModel`], a single
//! `complete(prompt)` call with no retries and no streaming. The production
//! implementation, [`ProviderModel`], wraps an `edgequake_llm` provider; tests
//! plug in scripted models.
//!
//! A provider that cannot be constructed at startup (typically a missing API
//! key) becomes an [`UnconfiguredModel`]: the service still starts, and
//! every model-backed operation fails with the construction error.

use crate::config::BuddyConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A single-shot text completion endpoint.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send `prompt` as one user message and return the response text.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// [`CompletionModel`] backed by an `edgequake_llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &BuddyConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }
}

#[async_trait]
impl CompletionModel for ProviderModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];

        let response = tokio::time::timeout(
            self.timeout,
            self.provider.chat(&messages, Some(&self.options)),
        )
        .await
        .map_err(|_| ModelError::Timeout {
            secs: self.timeout.as_secs(),
        })?
        .map_err(|e| ModelError::Provider(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// [`CompletionModel`] standing in for a provider that failed to resolve.
#[derive(Debug, Clone)]
pub struct UnconfiguredModel {
    error: ModelError,
}

impl UnconfiguredModel {
    pub fn new(error: ModelError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl CompletionModel for UnconfiguredModel {
    async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(self.error.clone())
    }
}

/// Resolve the model described by `config`.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is.
/// 2. **Named provider + model**: [`ProviderFactory::create_llm_provider`],
///    which reads the provider's API key from the environment.
///
/// Never fails: a resolution error is logged and wrapped in an
/// [`UnconfiguredModel`].
pub fn resolve_model(config: &BuddyConfig) -> Arc<dyn CompletionModel> {
    match resolve_provider(config) {
        Ok(provider) => Arc::new(ProviderModel::new(provider, config)),
        Err(e) => {
            warn!("LLM provider unavailable, model calls will fail: {}", e);
            Arc::new(UnconfiguredModel::new(e))
        }
    }
}

fn resolve_provider(config: &BuddyConfig) -> Result<Arc<dyn LLMProvider>, ModelError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    ProviderFactory::create_llm_provider(&config.provider_name, &config.model).map_err(|e| {
        ModelError::NotConfigured {
            provider: config.provider_name.clone(),
            hint: match config.model_credential_env() {
                Some(var) => format!("Set {var}. ({e})"),
                None => format!("{e}"),
            },
        }
    })
}

/// Build `CompletionOptions` from the config.
fn build_options(config: &BuddyConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}
