//! Memo generation entry points.
//!
//! One request runs one pipeline to completion: validate the form, resolve
//! the completion client, read the deck, build the prompt, make exactly one
//! completion call, clean the reply, render the PDF. Deck problems degrade
//! the request; everything else is fatal and returned as [`MemoError`].

use crate::config::{sdk_key_env, MemoConfig, MemoMode, ProviderKind, DEFAULT_API_KEY_ENV};
use crate::error::{MemoError, ProviderError};
use crate::form::FormInput;
use crate::output::{DeckReport, MemoOutput, MemoStats, Recommendation};
use crate::pipeline::deck::{self, DeckSource};
use crate::pipeline::extract::{self, DeckExtract};
use crate::pipeline::llm::{CompletionClient, HttpCompletionClient, RequestOptions, SdkCompletionClient};
use crate::pipeline::{postprocess, render};
use crate::progress::Stage;
use crate::prompts::{self, QUICK_WORD_LIMIT};
use edgequake_llm::ProviderFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Generate an investment memo from form inputs and an optional deck.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(MemoOutput)` on success, including when the deck could not be used
/// (check `output.deck.warning`).
///
/// # Errors
/// Returns `Err(MemoError)` for fatal errors:
/// - a required form field is empty (before any network call)
/// - no usable API key or provider
/// - the completion call failed
/// - the PDF could not be produced
pub async fn generate_memo(
    form: &FormInput,
    deck: Option<DeckSource>,
    config: &MemoConfig,
) -> Result<MemoOutput, MemoError> {
    let total_start = Instant::now();

    // ── Step 1: Validate inputs ──────────────────────────────────────────
    form.validate()?;
    info!(
        "Generating {:?} memo for '{}'",
        config.mode,
        form.startup_name.trim()
    );

    // ── Step 2: Resolve completion client ────────────────────────────────
    let client = resolve_client(config)?;
    debug!("Using completion client '{}'", client.name());

    // ── Step 3: Read pitch deck ──────────────────────────────────────────
    let stage = StageTimer::start(config, Stage::ReadDeck);
    let deck_extract = read_deck(deck, config).await?;
    stage.finish();
    if let Some(warning) = deck_extract.warning() {
        warn!("Continuing without pitch deck: {}", warning);
        if let Some(ref cb) = config.progress_callback {
            cb.on_deck_degraded(warning);
        }
    }

    // ── Step 4: Build prompt ─────────────────────────────────────────────
    let stage = StageTimer::start(config, Stage::BuildPrompt);
    let prompt = prompts::build_prompt(form, &deck_extract.text, config.mode);
    stage.finish();
    let prompt_chars = prompt.char_count();
    debug!("Prompt built: {} chars", prompt_chars);

    // ── Step 5: Completion call ──────────────────────────────────────────
    let llm_start = Instant::now();
    let stage = StageTimer::start(config, Stage::Complete);
    let completion = client.complete(prompt).await?;
    stage.finish();
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    info!("Completion received in {}ms", llm_duration_ms);

    // ── Step 6: Clean ────────────────────────────────────────────────────
    let stage = StageTimer::start(config, Stage::Clean);
    let markdown = postprocess::clean_memo_text(&completion.text);
    stage.finish();
    let word_count = postprocess::word_count(&markdown);
    if config.mode == MemoMode::Quick && word_count > QUICK_WORD_LIMIT {
        warn!(
            "Quick memo is {} words, over the {}-word ceiling",
            word_count, QUICK_WORD_LIMIT
        );
    }

    // ── Step 7: Render PDF ───────────────────────────────────────────────
    let stage = StageTimer::start(config, Stage::RenderPdf);
    let safe = render::to_pdf_safe(&markdown);
    let title = format!("{} investment memo", form.startup_name.trim());
    let pdf = render::render_memo_pdf(&safe, &title)?;
    stage.finish();

    // ── Step 8: Assemble output ──────────────────────────────────────────
    let recommendation = Recommendation::detect(&markdown);
    if recommendation.is_none() {
        warn!("No Proceed / Watch / Pass recommendation found in the memo");
    }

    let stats = MemoStats {
        prompt_chars,
        word_count,
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        pdf_substituted_chars: safe.substituted,
        pdf_bytes: pdf.len(),
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Memo complete: {} words, {} PDF bytes, {}ms total",
        stats.word_count, stats.pdf_bytes, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_memo_complete(word_count);
    }

    Ok(MemoOutput {
        startup_name: form.startup_name.trim().to_string(),
        mode: config.mode,
        markdown,
        pdf,
        deck: DeckReport::from_extract(&deck_extract),
        recommendation,
        stats,
    })
}

/// Synchronous wrapper around [`generate_memo`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_memo_sync(
    form: &FormInput,
    deck: Option<DeckSource>,
    config: &MemoConfig,
) -> Result<MemoOutput, MemoError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MemoError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_memo(form, deck, config))
}

/// Paths of the two artifacts written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub markdown: PathBuf,
    pub pdf: PathBuf,
}

/// Write `<name>_investment_memo.md` and `.pdf` into `dir`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_artifacts(
    output: &MemoOutput,
    dir: impl AsRef<Path>,
) -> Result<ArtifactPaths, MemoError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MemoError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let markdown = dir.join(output.markdown_file_name());
    let pdf = dir.join(output.pdf_file_name());
    write_atomic(&markdown, output.markdown.as_bytes()).await?;
    write_atomic(&pdf, &output.pdf).await?;

    info!("Wrote {} and {}", markdown.display(), pdf.display());
    Ok(ArtifactPaths { markdown, pdf })
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoError> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| MemoError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| MemoError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the completion client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`): used as-is. Tests and callers
///    with custom middleware go through here.
/// 2. **HTTP endpoint**: needs a resolved key from `config.credentials`;
///    a missing key fails here, before any network I/O.
/// 3. **SDK provider**: built through [`ProviderFactory`], which reads the
///    provider's own key variable and nothing else. `config.credentials` is
///    not consulted; the variable itself is checked up front so the user
///    gets the same missing-key error as for HTTP.
fn resolve_client(config: &MemoConfig) -> Result<Arc<dyn CompletionClient>, MemoError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let options = RequestOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        timeout: Duration::from_secs(config.api_timeout_secs),
    };

    match &config.provider {
        ProviderKind::Http { endpoint, model } => {
            let key = config.credentials.require("http", DEFAULT_API_KEY_ENV)?;
            let client = HttpCompletionClient::new(endpoint.as_str(), model.as_str(), key, options)?;
            Ok(Arc::new(client))
        }
        ProviderKind::Sdk { provider, model } => {
            if let Some(env_var) = sdk_key_env(provider) {
                let in_env = std::env::var(env_var)
                    .map(|v| !v.trim().is_empty())
                    .unwrap_or(false);
                if !in_env {
                    return Err(ProviderError::MissingCredential {
                        provider: provider.clone(),
                        env_var: env_var.to_string(),
                    }
                    .into());
                }
            }
            let llm = ProviderFactory::create_llm_provider(provider, model).map_err(|e| {
                MemoError::ProviderNotConfigured {
                    provider: provider.clone(),
                    hint: format!("{e}"),
                }
            })?;
            let label = format!("{provider}/{model}");
            Ok(Arc::new(SdkCompletionClient::new(llm, label, options)))
        }
    }
}

async fn read_deck(
    source: Option<DeckSource>,
    config: &MemoConfig,
) -> Result<DeckExtract, MemoError> {
    let Some(source) = source else {
        debug!("No pitch deck supplied");
        return Ok(DeckExtract::default());
    };

    let payload = match deck::load_deck(source, config.deck_max_bytes, config.download_timeout_secs).await {
        Ok(payload) => payload,
        Err(warning) => return Ok(DeckExtract::degraded(warning)),
    };
    extract::extract_deck(payload, config.deck_char_cap).await
}

/// Fires `on_stage_start` on creation and `on_stage_complete` on
/// [`StageTimer::finish`]. A stage that fails never reports completion.
struct StageTimer<'a> {
    config: &'a MemoConfig,
    stage: Stage,
    start: Instant,
}

impl<'a> StageTimer<'a> {
    fn start(config: &'a MemoConfig, stage: Stage) -> Self {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_start(stage);
        }
        Self {
            config,
            stage,
            start: Instant::now(),
        }
    }

    fn finish(self) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_complete(self.stage, self.start.elapsed().as_millis() as u64);
        }
    }
}
