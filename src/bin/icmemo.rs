//! CLI binary for ic-memo.
//!
//! A thin shim over the library crate: the flags are the screening form,
//! mapped to `FormInput` and `MemoConfig`. Writes the Markdown and PDF
//! artifacts and prints a short summary.

use anyhow::{Context, Result};
use clap::Parser;
use ic_memo::config::{sdk_key_env, DEFAULT_API_KEY_ENV, DEFAULT_HTTP_ENDPOINT, DEFAULT_MODEL};
use ic_memo::{
    generate_memo, write_artifacts, Credentials, DeckSource, DeckWarning, FormInput, FundingStage,
    MemoConfig, MemoMode, MemoProgressCallback, ProgressCallback, ProviderKind, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Busy indicator: one spinner whose message follows the current stage, plus
/// a log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("IC memo");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl MemoProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_deck_degraded(&self, warning: &DeckWarning) {
        self.bar.println(format!(
            "  {} {}\n    {}",
            yellow("⚠"),
            warning,
            dim("Continuing with the written inputs only.")
        ));
    }

    fn on_memo_complete(&self, word_count: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} Memo written ({} words)", green("✔"), bold(&word_count.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Quick screen from the command line
  icmemo --name Acme --description "Sells wrenches" \
         --founder-background "Ex-Snap engineer" --mode quick

  # Full memo with a pitch deck, long fields read from files
  icmemo --name Acme --description @acme/description.txt \
         --founder-background @acme/founders.txt --deck acme/deck.pdf

  # Deck from a URL, artifacts into ./memos
  icmemo --name Acme --description "..." --founder-background "..." \
         --deck https://example.com/acme-deck.pdf --out-dir memos

  # Use an edgequake-llm provider instead of the raw HTTP endpoint
  icmemo --provider gemini --model gemini-2.0-flash --name Acme ...

  # JSON output (memo, deck report, recommendation, stats)
  icmemo --json --name Acme ... > acme.json

OUTPUT:
  <name>_investment_memo.md    cleaned memo, UTF-8
  <name>_investment_memo.pdf   same memo, A4, ASCII/Latin-1 only

PROVIDERS:
  http         any chat-completions endpoint (default: OpenAI, gpt-4.1-nano)
               key from --api-key, else $OPENAI_API_KEY (see --api-key-env)
  openai       edgequake-llm, key from $OPENAI_API_KEY
  anthropic    edgequake-llm, key from $ANTHROPIC_API_KEY
  gemini       edgequake-llm, key from $GEMINI_API_KEY
  mistral      edgequake-llm, key from $MISTRAL_API_KEY
  ollama       edgequake-llm, local, no key

QUOTA:
  If the provider reports an exhausted quota, switch to --mode quick (far
  fewer tokens), wait a few minutes, or use your own key: --api-key for
  the http provider, the provider's key variable (e.g. $GEMINI_API_KEY)
  for SDK providers.

ENVIRONMENT VARIABLES:
  Every flag has an ICMEMO_* equivalent, e.g. ICMEMO_NAME, ICMEMO_DECK,
  ICMEMO_MODE, ICMEMO_MODEL. RUST_LOG overrides the log filter.
"#;

/// Screen an early-stage startup and write an investment committee memo.
#[derive(Parser, Debug)]
#[command(
    name = "icmemo",
    version,
    about = "Screen a startup and write an IC memo (Markdown + PDF) with an LLM",
    long_about = "Turn startup screening inputs (and an optional PDF pitch deck) into an \
investment committee memo. The model may only use the facts supplied; gaps are written as \
\"Information not provided\". Text fields accept @path to read the value from a file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    // ── Form ────────────────────────────────────────────────────────────
    /// Startup name (required).
    #[arg(long, env = "ICMEMO_NAME", default_value = "")]
    name: String,

    /// Sector, e.g. "Fintech".
    #[arg(long, env = "ICMEMO_SECTOR", default_value = "")]
    sector: String,

    /// Funding stage.
    #[arg(long, env = "ICMEMO_STAGE", value_enum, default_value = "pre-seed")]
    stage: StageArg,

    /// Geography, e.g. "Nigeria".
    #[arg(long, env = "ICMEMO_GEOGRAPHY", default_value = "")]
    geography: String,

    /// What the startup does (required).
    #[arg(long, env = "ICMEMO_DESCRIPTION", default_value = "")]
    description: String,

    /// Founder LinkedIn URL.
    #[arg(long, env = "ICMEMO_FOUNDER_LINKEDIN", default_value = "")]
    founder_linkedin: String,

    /// Founder background (required).
    #[arg(long, env = "ICMEMO_FOUNDER_BACKGROUND", default_value = "")]
    founder_background: String,

    /// Traction to date.
    #[arg(long, env = "ICMEMO_TRACTION", default_value = "")]
    traction: String,

    /// Business model.
    #[arg(long, env = "ICMEMO_BUSINESS_MODEL", default_value = "")]
    business_model: String,

    /// Go-to-market strategy.
    #[arg(long, env = "ICMEMO_GTM", default_value = "")]
    gtm: String,

    /// Pitch deck: local PDF path or HTTP/HTTPS URL.
    #[arg(long, env = "ICMEMO_DECK")]
    deck: Option<String>,

    // ── Generation ──────────────────────────────────────────────────────
    /// Memo template: quick (≤ 500 words) or full (11 sections + scoring).
    #[arg(long, env = "ICMEMO_MODE", value_enum, default_value = "full")]
    mode: ModeArg,

    /// Provider: "http" for a raw chat-completions endpoint, or an
    /// edgequake-llm provider name (openai, anthropic, gemini, ollama, …).
    #[arg(long, env = "ICMEMO_PROVIDER", default_value = "http")]
    provider: String,

    /// Chat-completions endpoint for the http provider.
    #[arg(long, env = "ICMEMO_ENDPOINT", default_value = DEFAULT_HTTP_ENDPOINT)]
    endpoint: String,

    /// Model ID.
    #[arg(long, env = "ICMEMO_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API key for this run; beats the environment default (http provider only).
    #[arg(long, env = "ICMEMO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Environment variable holding the default key for the http provider.
    #[arg(long, env = "ICMEMO_API_KEY_ENV", default_value = DEFAULT_API_KEY_ENV)]
    api_key_env: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "ICMEMO_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "ICMEMO_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "ICMEMO_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Characters of deck text passed to the model (2000–10000).
    #[arg(long, env = "ICMEMO_DECK_CHAR_CAP", default_value_t = 6000)]
    deck_char_cap: usize,

    /// Decks larger than this many MB are skipped.
    #[arg(long, env = "ICMEMO_MAX_DECK_MB", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=200))]
    max_deck_mb: u64,

    /// Deck download timeout in seconds.
    #[arg(long, env = "ICMEMO_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    // ── Output ──────────────────────────────────────────────────────────
    /// Directory for the .md and .pdf artifacts.
    #[arg(short, long, env = "ICMEMO_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Print the memo Markdown to stdout as well.
    #[arg(long, env = "ICMEMO_STDOUT")]
    stdout: bool,

    /// Print structured JSON (MemoOutput) to stdout.
    #[arg(long, env = "ICMEMO_JSON", conflicts_with = "stdout")]
    json: bool,

    /// Disable the busy indicator.
    #[arg(long, env = "ICMEMO_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ICMEMO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ICMEMO_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ModeArg {
    Quick,
    Full,
}

impl From<ModeArg> for MemoMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Quick => MemoMode::Quick,
            ModeArg::Full => MemoMode::Full,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StageArg {
    PreSeed,
    Seed,
}

impl From<StageArg> for FundingStage {
    fn from(v: StageArg) -> Self {
        match v {
            StageArg::PreSeed => FundingStage::PreSeed,
            StageArg::Seed => FundingStage::Seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Credentials first ────────────────────────────────────────────────
    // No point collecting inputs for a run that cannot reach a model.
    let (provider, credentials) = resolve_provider(&cli)?;

    // ── Collect form ─────────────────────────────────────────────────────
    let form = build_form(&cli).await?;
    if let Err(e) = form.validate() {
        anyhow::bail!("{e}");
    }
    let deck = cli.deck.as_deref().map(DeckSource::parse);

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };

    let mut builder = MemoConfig::builder()
        .mode(cli.mode.clone().into())
        .provider(provider)
        .credentials(credentials)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .deck_char_cap(cli.deck_char_cap)
        .deck_max_bytes(cli.max_deck_mb * 1024 * 1024)
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref cb) = spinner {
        builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Generate ─────────────────────────────────────────────────────────
    let output = match generate_memo(&form, deck, &config).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(ref cb) = spinner {
                cb.abandon();
            }
            if e.is_quota_exhausted() {
                eprintln!("{} {}", red("✘"), bold("AI quota exhausted"));
            }
            return Err(anyhow::Error::new(e).context("Memo generation failed"));
        }
    };

    let paths = write_artifacts(&output, &cli.out_dir)
        .await
        .context("Failed to write memo artifacts")?;

    // ── Print ────────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        // The spinner already reported a skipped deck.
        if !show_progress {
            if let Some(ref w) = output.deck.warning {
                eprintln!("{} {}  {}", yellow("⚠"), w, dim("(memo uses written inputs only)"));
            }
        }
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            output
                .recommendation
                .map(|r| format!("Recommendation: {}", bold(&r.to_string())))
                .unwrap_or_else(|| yellow("no recommendation found")),
            bold(&paths.markdown.display().to_string()),
        );
        eprintln!("   {}", bold(&paths.pdf.display().to_string()));
        eprintln!(
            "   {} words  /  {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.word_count.to_string()),
            dim(&fmt_tokens(output.stats.input_tokens)),
            dim(&fmt_tokens(output.stats.output_tokens)),
            output.stats.total_duration_ms,
        );
        if output.stats.pdf_substituted_chars > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} character(s) shown as '?' in the PDF",
                    output.stats.pdf_substituted_chars
                ))
            );
        }
    }

    Ok(())
}

/// Pick the provider shape and its credentials, failing if no key is usable.
fn resolve_provider(cli: &Cli) -> Result<(ProviderKind, Credentials)> {
    let name = cli.provider.trim().to_ascii_lowercase();
    if name == "http" {
        let credentials = Credentials::from_env(&cli.api_key_env).with_override(cli.api_key.clone());
        credentials.require("http", &cli.api_key_env)?;
        let provider = ProviderKind::Http {
            endpoint: cli.endpoint.clone(),
            model: cli.model.clone(),
        };
        return Ok((provider, credentials));
    }

    let credentials = match sdk_key_env(&name) {
        Some(env_var) => {
            let credentials = Credentials::from_env(env_var).with_override(cli.api_key.clone());
            credentials.require(&name, env_var)?;
            credentials
        }
        None => Credentials::default().with_override(cli.api_key.clone()),
    };
    let provider = ProviderKind::Sdk {
        provider: name,
        model: cli.model.clone(),
    };
    Ok((provider, credentials))
}

/// Map CLI args to `FormInput`, reading `@path` values from disk.
async fn build_form(cli: &Cli) -> Result<FormInput> {
    Ok(FormInput {
        startup_name: read_field("name", &cli.name).await?,
        sector: read_field("sector", &cli.sector).await?,
        stage: cli.stage.clone().into(),
        geography: read_field("geography", &cli.geography).await?,
        description: read_field("description", &cli.description).await?,
        founder_linkedin: read_field("founder-linkedin", &cli.founder_linkedin).await?,
        founder_background: read_field("founder-background", &cli.founder_background).await?,
        traction: read_field("traction", &cli.traction).await?,
        business_model: read_field("business-model", &cli.business_model).await?,
        gtm_strategy: read_field("gtm", &cli.gtm).await?,
    })
}

/// `@path` reads the field from a file; anything else is taken literally.
async fn read_field(flag: &str, value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) if !path.is_empty() => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read --{flag} from '{path}'")),
        _ => Ok(value.to_string()),
    }
}

fn fmt_tokens(n: Option<usize>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "?".into())
}
