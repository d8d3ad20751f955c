//! Error types for the ic-memo library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`MemoError`] — **Fatal**: the memo cannot be produced for this request
//!   (missing required field, provider failure, output not writable).
//!   Returned as `Err(MemoError)` from [`crate::generate_memo`].
//!
//! * [`ProviderError`] — the completion call failed. Always terminal for the
//!   request; wrapped in [`MemoError::Provider`]. Nothing is retried.
//!
//! * [`DeckWarning`] — **Non-fatal**: the pitch deck could not be used
//!   (too large, not a PDF, no extractable text). Stored inside
//!   [`crate::output::DeckReport`] so the memo still gets written from the
//!   form inputs alone.

use crate::config::sdk_key_env;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ic-memo library.
#[derive(Debug, Error)]
pub enum MemoError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// One or more required form fields are empty.
    #[error("Missing required input: {}.\nStartup name, description, and founder background are required.", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    // ── Export errors ─────────────────────────────────────────────────────
    /// The PDF document could not be produced.
    #[error("PDF export failed: {0}")]
    PdfRender(String),

    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MemoError {
    /// True when the provider reported an exhausted quota.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, MemoError::Provider(ProviderError::QuotaExhausted { .. }))
    }
}

/// Failure of the single completion call made per request.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No usable API key; raised before any network I/O.
    #[error("No API key available for provider '{provider}'.\n{}", missing_key_hint(.provider, .env_var))]
    MissingCredential { provider: String, env_var: String },

    /// Connection, TLS or DNS failure.
    #[error("Request to '{provider}' failed: {detail}")]
    Transport { provider: String, detail: String },

    /// The call did not finish within the configured bound.
    #[error("Request to '{provider}' timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// Non-2xx response that is not a quota signal.
    #[error("Provider '{provider}' returned HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    /// The provider's quota or rate budget is used up.
    #[error(
        "AI quota exhausted for provider '{provider}'.\nTry one of:\n  \
         • switch to quick mode (--mode quick), which uses far fewer tokens\n  \
         • wait a few minutes and try again\n  \
         • {}\n\
         Provider said: {detail}",
        own_key_hint(.provider)
    )]
    QuotaExhausted { provider: String, detail: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from '{provider}': {detail}")]
    MalformedResponse { provider: String, detail: String },

    /// The provider answered successfully but with no text.
    #[error("Provider '{provider}' returned an empty completion")]
    EmptyCompletion { provider: String },
}

/// SDK providers read their key from the environment only, so `--api-key`
/// is offered just for the HTTP client. Labels may carry a `/model` suffix.
fn sdk_env_for(provider: &str) -> Option<&'static str> {
    let name = provider.split('/').next().unwrap_or(provider);
    sdk_key_env(name)
}

fn own_key_hint(provider: &str) -> String {
    match sdk_env_for(provider) {
        Some(env_var) => format!("put a key with remaining quota in {env_var}"),
        None => "supply your own API key with --api-key".to_string(),
    }
}

fn missing_key_hint(provider: &str, env_var: &str) -> String {
    match sdk_env_for(provider) {
        Some(_) => format!("Set {env_var}."),
        None => format!("Set {env_var} or pass --api-key."),
    }
}

/// A non-fatal problem with the pitch deck.
///
/// The memo is still generated; it relies on the written inputs only.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DeckWarning {
    /// Deck is over the upload size bound and was not parsed.
    #[error("Pitch deck is {}MB. Only decks under {}MB can be processed.", .size_bytes / (1024 * 1024), .limit_bytes / (1024 * 1024))]
    TooLarge { size_bytes: u64, limit_bytes: u64 },

    /// Payload does not start with the `%PDF` magic.
    #[error("Pitch deck '{name}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// The PDF parser failed or panicked.
    #[error("Pitch deck '{name}' could not be read: {detail}")]
    Unreadable { name: String, detail: String },

    /// Every page was empty (scanned or image-only deck).
    #[error("Pitch deck '{name}' contains no extractable text")]
    NoText { name: String },

    /// Local deck path does not exist or is not readable.
    #[error("Pitch deck not found: '{}'", .path.display())]
    NotFound { path: PathBuf },

    /// Deck URL could not be fetched.
    #[error("Failed to download pitch deck '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },
}
