//! Configuration types for memo generation.
//!
//! All generation behaviour is controlled through [`MemoConfig`], built via
//! its [`MemoConfigBuilder`]. Credentials live in the config as an explicit
//! [`Credentials`] value that is resolved once per request; nothing is read
//! from ambient state once the config exists.

use crate::error::{MemoError, ProviderError};
use crate::pipeline::llm::CompletionClient;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default chat-completions endpoint for the HTTP provider.
pub const DEFAULT_HTTP_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for both provider shapes.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Default environment variable holding the HTTP provider's API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Smallest and largest accepted deck character cap.
pub const DECK_CHAR_CAP_RANGE: (usize, usize) = (2_000, 10_000);

/// Configuration for a memo generation request.
///
/// # Example
/// ```rust
/// use ic_memo::{MemoConfig, MemoMode};
///
/// let config = MemoConfig::builder()
///     .mode(MemoMode::Quick)
///     .api_key("sk-test")
///     .deck_char_cap(3000)
///     .build()
///     .unwrap();
/// assert_eq!(config.deck_char_cap, 3000);
/// ```
#[derive(Clone)]
pub struct MemoConfig {
    /// Which prompt template to use. Default: [`MemoMode::Full`].
    pub mode: MemoMode,

    /// Which provider shape to construct. Ignored when `client` is set.
    pub provider: ProviderKind,

    /// Pre-constructed completion client. Takes precedence over `provider`.
    pub client: Option<Arc<dyn CompletionClient>>,

    /// API key resolution for this request.
    pub credentials: Credentials,

    /// Sampling temperature. Default: 0.4.
    pub temperature: f32,

    /// Response token ceiling. Default: 2000.
    pub max_tokens: usize,

    /// Upper bound on the single completion call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Decks larger than this are not parsed. Default: 10 MB.
    pub deck_max_bytes: u64,

    /// Extracted deck text is truncated to this many characters. Default: 6000.
    ///
    /// Bounds prompt size on free-tier models. Clamped to 2000–10000.
    pub deck_char_cap: usize,

    /// Download timeout for deck URLs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional stage-progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            mode: MemoMode::default(),
            provider: ProviderKind::default(),
            client: None,
            credentials: Credentials::default(),
            temperature: 0.4,
            max_tokens: 2000,
            api_timeout_secs: 60,
            deck_max_bytes: 10 * 1024 * 1024,
            deck_char_cap: 6000,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for MemoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoConfig")
            .field("mode", &self.mode)
            .field("provider", &self.provider)
            .field("client", &self.client.as_ref().map(|c| c.name().to_string()))
            .field("credentials", &self.credentials)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("deck_max_bytes", &self.deck_max_bytes)
            .field("deck_char_cap", &self.deck_char_cap)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl MemoConfig {
    /// Create a new builder for `MemoConfig`.
    pub fn builder() -> MemoConfigBuilder {
        MemoConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`MemoConfig`].
#[derive(Debug)]
pub struct MemoConfigBuilder {
    config: MemoConfig,
}

impl MemoConfigBuilder {
    pub fn mode(mut self, mode: MemoMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Set the process-wide default key (normally read from the environment).
    pub fn default_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.credentials.default_credential = Some(key.into());
        self
    }

    /// Set the per-request key supplied by the user. Wins over the default.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.credentials.override_credential = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn deck_max_bytes(mut self, bytes: u64) -> Self {
        self.config.deck_max_bytes = bytes;
        self
    }

    pub fn deck_char_cap(mut self, chars: usize) -> Self {
        self.config.deck_char_cap = chars.clamp(DECK_CHAR_CAP_RANGE.0, DECK_CHAR_CAP_RANGE.1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<MemoConfig, MemoError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(MemoError::InvalidConfig(
                "API timeout must be at least 1 second".into(),
            ));
        }
        if c.deck_max_bytes == 0 {
            return Err(MemoError::InvalidConfig(
                "Deck size limit must be greater than zero".into(),
            ));
        }
        match &c.provider {
            ProviderKind::Http { endpoint, model } => {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(MemoError::InvalidConfig(format!(
                        "Endpoint must be an HTTP/HTTPS URL, got '{endpoint}'"
                    )));
                }
                if model.trim().is_empty() {
                    return Err(MemoError::InvalidConfig("Model must not be empty".into()));
                }
            }
            ProviderKind::Sdk { provider, model } => {
                if provider.trim().is_empty() || model.trim().is_empty() {
                    return Err(MemoError::InvalidConfig(
                        "SDK provider and model must not be empty".into(),
                    ));
                }
                // SDK providers read their key from the environment.
                if c.client.is_none() && c.credentials.override_credential.is_some() {
                    return Err(MemoError::InvalidConfig(format!(
                        "--api-key is only supported with the HTTP provider; \
                         set {} instead for '{}'",
                        sdk_key_env(provider).unwrap_or("the provider's API key variable"),
                        provider
                    )));
                }
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Prompt template family.
///
/// | Mode | Length | Rubric |
/// |------|--------|--------|
/// | Quick | ≤ 500 words, six points | none |
/// | Full  | eleven sections | weighted scoring |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoMode {
    Quick,
    #[default]
    Full,
}

/// Which completion provider shape to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Raw POST to a chat-completions endpoint with bearer auth.
    Http { endpoint: String, model: String },
    /// edgequake-llm provider by name ("openai", "gemini", "anthropic", "ollama", …).
    Sdk { provider: String, model: String },
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::Http {
            endpoint: DEFAULT_HTTP_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ProviderKind {
    /// Short label for logs and error messages.
    pub fn label(&self) -> &str {
        match self {
            ProviderKind::Http { .. } => "http",
            ProviderKind::Sdk { provider, .. } => provider,
        }
    }
}

/// Environment variable an SDK provider reads its key from.
///
/// `None` means the provider runs without a key (local Ollama / LM Studio).
pub fn sdk_key_env(provider: &str) -> Option<&'static str> {
    match provider.to_ascii_lowercase().as_str() {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "gemini" | "google" => Some("GEMINI_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "xai" => Some("XAI_API_KEY"),
        _ => None,
    }
}

/// Per-request API key resolution.
///
/// `override_credential` (typed by the user for this request) beats
/// `default_credential` (process-wide, from the environment). Blank values
/// count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub default_credential: Option<String>,
    pub override_credential: Option<String>,
}

impl Credentials {
    /// Read the default from `env_var`; the override stays empty.
    pub fn from_env(env_var: &str) -> Self {
        Self {
            default_credential: std::env::var(env_var).ok(),
            override_credential: None,
        }
    }

    pub fn with_override(mut self, key: Option<String>) -> Self {
        self.override_credential = key;
        self
    }

    /// The key to use for this request, if any.
    pub fn resolve(&self) -> Option<&str> {
        fn usable(key: &Option<String>) -> Option<&str> {
            key.as_deref().map(str::trim).filter(|k| !k.is_empty())
        }
        usable(&self.override_credential).or_else(|| usable(&self.default_credential))
    }

    /// Like [`Credentials::resolve`] but fails fast with a configuration error.
    pub fn require(&self, provider: &str, env_var: &str) -> Result<&str, ProviderError> {
        self.resolve().ok_or_else(|| ProviderError::MissingCredential {
            provider: provider.to_string(),
            env_var: env_var.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("default_credential", &mask(&self.default_credential))
            .field("override_credential", &mask(&self.override_credential))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_configuration() {
        let c = MemoConfig::default();
        assert_eq!(c.mode, MemoMode::Full);
        assert_eq!(c.temperature, 0.4);
        assert_eq!(c.max_tokens, 2000);
        assert_eq!(c.api_timeout_secs, 60);
        assert_eq!(c.deck_max_bytes, 10 * 1024 * 1024);
        assert_eq!(c.deck_char_cap, 6000);
    }

    #[test]
    fn deck_char_cap_is_clamped() {
        let low = MemoConfig::builder().deck_char_cap(10).build().unwrap();
        assert_eq!(low.deck_char_cap, 2000);
        let high = MemoConfig::builder().deck_char_cap(50_000).build().unwrap();
        assert_eq!(high.deck_char_cap, 10_000);
    }

    #[test]
    fn override_credential_wins() {
        let creds = Credentials {
            default_credential: Some("env-key".into()),
            override_credential: Some("user-key".into()),
        };
        assert_eq!(creds.resolve(), Some("user-key"));
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        let creds = Credentials {
            default_credential: Some("env-key".into()),
            override_credential: Some("   ".into()),
        };
        assert_eq!(creds.resolve(), Some("env-key"));
    }

    #[test]
    fn missing_credential_is_reported() {
        let creds = Credentials::default();
        let err = creds.require("http", "OPENAI_API_KEY").unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn credentials_debug_redacts_keys() {
        let creds = Credentials {
            default_credential: Some("sk-secret".into()),
            override_credential: None,
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = MemoConfig::builder()
            .provider(ProviderKind::Http {
                endpoint: "ftp://example.com".into(),
                model: "m".into(),
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, MemoError::InvalidConfig(_)));
    }

    #[test]
    fn sdk_provider_rejects_override_key() {
        let err = MemoConfig::builder()
            .provider(ProviderKind::Sdk {
                provider: "gemini".into(),
                model: "gemini-2.0-flash".into(),
            })
            .api_key("user-key")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn sdk_key_env_mapping() {
        assert_eq!(sdk_key_env("Gemini"), Some("GEMINI_API_KEY"));
        assert_eq!(sdk_key_env("ollama"), None);
    }
}
