//! Completion providers: send the prompt, get the memo text back.
//!
//! Two provider shapes sit behind one trait, [`CompletionClient`]:
//!
//! * [`SdkCompletionClient`] — an edgequake-llm provider (OpenAI, Gemini,
//!   Anthropic, Ollama, …) addressed by name and model.
//! * [`HttpCompletionClient`] — a raw POST to any chat-completions endpoint
//!   with bearer-token auth.
//!
//! Exactly one call is made per request. There is no retry and no backoff: a
//! failure is terminal and surfaces as a [`ProviderError`]. Quota exhaustion
//! is told apart from other failures so the user gets an actionable message.

use crate::error::ProviderError;
use crate::prompts::Prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Raw reply from the provider, before cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub input_tokens: Option<usize>,
    pub output_tokens: Option<usize>,
}

/// The single operation the pipeline needs from a provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Short provider label for logs and errors.
    fn name(&self) -> &str;

    /// Send `prompt` and return the model's reply.
    async fn complete(&self, prompt: Prompt) -> Result<Completion, ProviderError>;
}

/// Sampling and bounding options shared by both provider shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestOptions {
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 2000,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Provider codes and phrases that mean the quota or rate budget is spent.
static RE_QUOTA_SIGNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:resource_exhausted|insufficient_quota|quota[ _]exceeded|exceeded your current quota|too many requests)\b",
    )
    .unwrap()
});

/// True when a provider error signals an exhausted quota: HTTP 429, or a
/// known quota code in the error text. A bare "429" or "quota" in the text
/// is not enough; request ids and unrelated messages contain both.
pub fn is_quota_signal(status: Option<u16>, text: &str) -> bool {
    status == Some(429) || RE_QUOTA_SIGNAL.is_match(text)
}

// ── HTTP provider ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<usize>,
    completion_tokens: Option<usize>,
}

/// Raw chat-completions POST with bearer auth.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    options: RequestOptions,
}

impl HttpCompletionClient {
    /// Build a client. The key must already be resolved; the timeout is
    /// enforced by the underlying HTTP client.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        options: RequestOptions,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ProviderError::Transport {
                provider: "http".into(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            options,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete(&self, prompt: Prompt) -> Result<Completion, ProviderError> {
        let provider = self.name().to_string();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: prompt.as_str(),
            }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        let start = Instant::now();
        info!("POST {} (model {})", self.endpoint, self.model);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: provider.clone(),
                        secs: self.options.timeout.as_secs(),
                    }
                } else {
                    ProviderError::Transport {
                        provider: provider.clone(),
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ProviderError::Transport {
            provider: provider.clone(),
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            warn!("Provider returned HTTP {}", status.as_u16());
            if is_quota_signal(Some(status.as_u16()), &text) {
                return Err(ProviderError::QuotaExhausted {
                    provider,
                    detail: truncate_detail(&text),
                });
            }
            return Err(ProviderError::Http {
                provider,
                status: status.as_u16(),
                body: truncate_detail(&text),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
                provider: provider.clone(),
                detail: e.to_string(),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: provider.clone(),
                detail: "response has no choices".into(),
            })?
            .message
            .content
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion { provider });
        }

        let usage = parsed.usage;
        debug!(
            "Completion: {} chars in {:?}",
            content.len(),
            start.elapsed()
        );
        Ok(Completion {
            text: content,
            input_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }
}

// ── SDK provider ─────────────────────────────────────────────────────────────

/// An edgequake-llm provider driven with a single user message.
pub struct SdkCompletionClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: RequestOptions,
}

impl SdkCompletionClient {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            provider,
            label: label.into(),
            options,
        }
    }
}

#[async_trait]
impl CompletionClient for SdkCompletionClient {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, prompt: Prompt) -> Result<Completion, ProviderError> {
        let messages = vec![ChatMessage::user(prompt.as_str())];
        let options = CompletionOptions {
            temperature: Some(self.options.temperature),
            max_tokens: Some(self.options.max_tokens),
            ..Default::default()
        };

        let start = Instant::now();
        info!("Calling provider '{}'", self.label);
        let result = tokio::time::timeout(
            self.options.timeout,
            self.provider.chat(&messages, Some(&options)),
        )
        .await
        .map_err(|_| ProviderError::Timeout {
            provider: self.label.clone(),
            secs: self.options.timeout.as_secs(),
        })?;

        let response = result.map_err(|e| {
            let detail = format!("{}", e);
            warn!("Provider '{}' failed: {}", self.label, detail);
            if is_quota_signal(None, &detail) {
                ProviderError::QuotaExhausted {
                    provider: self.label.clone(),
                    detail: truncate_detail(&detail),
                }
            } else {
                ProviderError::Transport {
                    provider: self.label.clone(),
                    detail,
                }
            }
        })?;

        if response.content.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion {
                provider: self.label.clone(),
            });
        }

        debug!(
            "Provider '{}': {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(Completion {
            text: response.content,
            input_tokens: Some(response.prompt_tokens as usize),
            output_tokens: Some(response.completion_tokens as usize),
        })
    }
}

/// Keep provider error bodies short enough for a terminal.
fn truncate_detail(text: &str) -> String {
    const MAX: usize = 300;
    let trimmed = text.trim();
    if trimmed.chars().count() > MAX {
        let cut: String = trimmed.chars().take(MAX).collect();
        format!("{cut}\u{2026}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_options_defaults() {
        let opts = RequestOptions::default();
        assert_eq!(opts.temperature, 0.4);
        assert_eq!(opts.max_tokens, 2000);
        assert_eq!(opts.timeout, Duration::from_secs(60));
    }

    #[test]
    fn quota_signals() {
        assert!(is_quota_signal(Some(429), ""));
        assert!(is_quota_signal(None, "Error: RESOURCE_EXHAUSTED"));
        assert!(is_quota_signal(Some(400), r#"{"error":{"code":"insufficient_quota"}}"#));
        assert!(!is_quota_signal(Some(500), "internal error"));
        assert!(!is_quota_signal(None, "connection refused"));
        assert!(is_quota_signal(None, "429 Too Many Requests"));
        assert!(is_quota_signal(None, "Quota exceeded for metric generate_content"));
    }

    #[test]
    fn incidental_429_or_quota_text_is_not_quota() {
        assert!(!is_quota_signal(Some(500), "request id req_4291abc failed"));
        assert!(!is_quota_signal(None, "upstream error (trace 7f429e)"));
        assert!(!is_quota_signal(Some(400), "quota project not set for this API"));
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatRequestMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.4,
            max_tokens: 2000,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 2000);
        assert!((json["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn response_parsing_reads_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"memo"}},{"message":{"content":"other"}}],"usage":{"prompt_tokens":10,"completion_tokens":3}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("memo"));
        assert_eq!(parsed.usage.unwrap().completion_tokens, Some(3));
    }

    #[test]
    fn long_details_are_truncated() {
        let long = "x".repeat(1000);
        let out = truncate_detail(&long);
        assert_eq!(out.chars().count(), 301);
    }
}
