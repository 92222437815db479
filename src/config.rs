//! Configuration for the research buddy.
//!
//! Every credential and knob lives in one [`BuddyConfig`], built once at
//! startup (via [`BuddyConfigBuilder`] or [`BuddyConfig::from_env`]) and then
//! passed by reference to whatever needs it. Nothing in the crate reads the
//! environment after that point.
//!
//! Missing credentials are not a startup error: [`BuddyConfig::warn_missing_credentials`]
//! logs them, and the corresponding operation fails when it is invoked.

use crate::error::BuddyError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Default Notion REST endpoint.
pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";

/// Notion API version sent in the `Notion-Version` header.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Default provider name passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for the research buddy.
///
/// # Example
/// ```rust
/// use notion_research_buddy::BuddyConfig;
///
/// let config = BuddyConfig::builder()
///     .notion_api_key("secret_xxx")
///     .model("gemini-2.0-flash")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.provider_name, "gemini");
/// ```
#[derive(Clone)]
pub struct BuddyConfig {
    /// Notion integration token. `None` makes every Notion call fail with
    /// a missing-credential error.
    pub notion_api_key: Option<String>,

    /// Base URL of the Notion API. Overridden in tests to point at a mock server.
    pub notion_base_url: String,

    /// Value of the `Notion-Version` header.
    pub notion_version: String,

    /// Transport timeout for each Notion request, in seconds. Default: 30.
    pub notion_timeout_secs: u64,

    /// Provider name for `ProviderFactory` (e.g. "gemini", "openai"). Default: "gemini".
    pub provider_name: String,

    /// Model identifier. Default: "gemini-2.0-flash".
    pub model: String,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Low enough that refinements stay faithful to the notes, high enough
    /// that diagram layouts are not rigidly identical between runs.
    pub temperature: f32,

    /// Maximum tokens per completion. `None` leaves the provider default.
    pub max_tokens: Option<usize>,

    /// Per-completion timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Receives events while a page is processed.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BuddyConfig {
    fn default() -> Self {
        Self {
            notion_api_key: None,
            notion_base_url: DEFAULT_NOTION_BASE_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            notion_timeout_secs: 30,
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider: None,
            temperature: 0.2,
            max_tokens: None,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BuddyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuddyConfig")
            .field(
                "notion_api_key",
                &self.notion_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("notion_base_url", &self.notion_base_url)
            .field("notion_version", &self.notion_version)
            .field("notion_timeout_secs", &self.notion_timeout_secs)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl BuddyConfig {
    /// Create a new builder for `BuddyConfig`.
    pub fn builder() -> BuddyConfigBuilder {
        BuddyConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads `NOTION_API_KEY`, and `EDGEQUAKE_LLM_PROVIDER` / `EDGEQUAKE_MODEL`
    /// when set. Provider API keys (`GEMINI_API_KEY`, …) are read later by
    /// `ProviderFactory`.
    pub fn from_env() -> Self {
        let mut config = Self {
            notion_api_key: non_empty_env("NOTION_API_KEY"),
            ..Self::default()
        };
        if let Some(provider) = non_empty_env("EDGEQUAKE_LLM_PROVIDER") {
            config.provider_name = provider;
        }
        if let Some(model) = non_empty_env("EDGEQUAKE_MODEL") {
            config.model = model;
        }
        config
    }

    /// Environment variable holding the API key of the configured provider,
    /// if the provider needs one.
    pub fn model_credential_env(&self) -> Option<&'static str> {
        match self.provider_name.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some("GEMINI_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            "mistral" => Some("MISTRAL_API_KEY"),
            "openrouter" => Some("OPENROUTER_API_KEY"),
            _ => None,
        }
    }

    /// Log a warning for each missing credential and return their names.
    ///
    /// Never fails: the service still starts and the affected operations
    /// report the problem when they run.
    pub fn warn_missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.notion_api_key.is_none() {
            warn!("NOTION_API_KEY not set. Notion operations will fail.");
            missing.push("NOTION_API_KEY");
        }
        if self.provider.is_none() {
            if let Some(var) = self.model_credential_env() {
                if non_empty_env(var).is_none() {
                    warn!("{} not set. LLM operations will fail.", var);
                    missing.push(var);
                }
            }
        }
        missing
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`BuddyConfig`].
#[derive(Debug)]
pub struct BuddyConfigBuilder {
    config: BuddyConfig,
}

impl BuddyConfigBuilder {
    pub fn notion_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.notion_api_key = Some(key.into());
        self
    }

    pub fn notion_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.notion_base_url = url.into();
        self
    }

    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.config.notion_version = version.into();
        self
    }

    pub fn notion_timeout_secs(mut self, secs: u64) -> Self {
        self.config.notion_timeout_secs = secs;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BuddyConfig, BuddyError> {
        let c = &self.config;
        if !c.notion_base_url.starts_with("http://") && !c.notion_base_url.starts_with("https://")
        {
            return Err(BuddyError::InvalidConfig(format!(
                "Notion base URL must be http(s), got '{}'",
                c.notion_base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(BuddyError::InvalidConfig("model must not be empty".into()));
        }
        if c.notion_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(BuddyError::InvalidConfig("timeouts must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}
