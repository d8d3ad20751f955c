//! # ic-memo
//!
//! Turn startup screening inputs into an investment committee (IC) memo with
//! a large language model, and export it as Markdown and PDF.
//!
//! ## Why this crate?
//!
//! Early-stage screening means writing the same memo again and again from
//! a short description, a founder bio and a pitch deck. This crate turns those
//! inputs into a grounded first draft: the model may only use facts it was
//! given, must write "Information not provided" for gaps, and has to end with
//! a Proceed / Watch / Pass call. The model's output is then cleaned up and
//! laid out as a PDF that only needs the built-in fonts.
//!
//! ## Pipeline Overview
//!
//! ```text
//! FormInput (+ optional pitch deck)
//!  │
//!  ├─ 1. Validate  startup name, description, founder background required
//!  ├─ 2. Deck      upload / path / URL → size + %PDF checks → text (capped)
//!  ├─ 3. Prompt    Quick (≤ 500 words) or Full (11 sections + scoring)
//!  ├─ 4. LLM       one completion call, HTTP or edgequake-llm provider
//!  ├─ 5. Clean     whitespace, digit-unit joins, blank lines
//!  └─ 6. Export    Markdown as-is, PDF via ASCII/Latin-1 normalisation
//! ```
//!
//! A deck that cannot be used never fails the request: the memo is written
//! from the form alone and [`MemoOutput::deck`] carries the warning.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ic_memo::{generate_memo, write_artifacts, FormInput, MemoConfig, MemoMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let form = FormInput::new("Acme", "Sells wrenches", "Ex-Snap engineer");
//!     let config = MemoConfig::builder()
//!         .mode(MemoMode::Quick)
//!         .default_api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
//!         .build()?;
//!     let output = generate_memo(&form, None, &config).await?;
//!     let paths = write_artifacts(&output, ".").await?;
//!     println!("{}", paths.pdf.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `icmemo` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ic-memo = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod form;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Credentials, MemoConfig, MemoConfigBuilder, MemoMode, ProviderKind};
pub use error::{DeckWarning, MemoError, ProviderError};
pub use form::{FormInput, FundingStage};
pub use generate::{generate_memo, generate_memo_sync, write_artifacts, ArtifactPaths};
pub use output::{DeckReport, MemoOutput, MemoStats, Recommendation};
pub use pipeline::deck::DeckSource;
pub use pipeline::llm::{Completion, CompletionClient};
pub use progress::{MemoProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use prompts::Prompt;
