//! End-to-end tests for ic-memo against a live provider.
//!
//! These make real LLM API calls. They are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test e2e -- --nocapture
//!
//! Optional:
//!   E2E_DECK=path/to/deck.pdf   also exercise deck extraction
//!   E2E_MODEL=gpt-4.1-mini      override the model

use ic_memo::config::{DEFAULT_API_KEY_ENV, DEFAULT_HTTP_ENDPOINT, DEFAULT_MODEL};
use ic_memo::{
    generate_memo, write_artifacts, Credentials, DeckSource, FormInput, MemoConfig, MemoMode,
    ProviderKind,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set and a key is available.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let credentials = Credentials::from_env(DEFAULT_API_KEY_ENV);
        if credentials.resolve().is_none() {
            println!("SKIP — {} is not set", DEFAULT_API_KEY_ENV);
            return;
        }
        credentials
    }};
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/e2e-memos");
    std::fs::create_dir_all(&d).ok();
    d
}

fn live_config(credentials: Credentials, mode: MemoMode) -> MemoConfig {
    let model = std::env::var("E2E_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    MemoConfig::builder()
        .mode(mode)
        .provider(ProviderKind::Http {
            endpoint: DEFAULT_HTTP_ENDPOINT.to_string(),
            model,
        })
        .credentials(credentials)
        .build()
        .unwrap()
}

/// Assert the memo passes basic quality checks.
fn assert_memo_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] memo is empty");
    assert_eq!(md, md.trim(), "[{context}] memo must be trimmed");
    assert!(!md.contains("\n\n\n"), "[{context}] memo has a 3+ newline run");
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_acme_quick() {
    let credentials = e2e_skip_unless_ready!();
    let config = live_config(credentials, MemoMode::Quick);
    let mut form = FormInput::new("Acme", "Sells wrenches", "Ex-Snap engineer");
    form.traction = String::new();

    let output = generate_memo(&form, None, &config)
        .await
        .expect("quick memo should succeed");

    assert_memo_quality(&output.markdown, "acme quick");
    assert!(
        output.stats.word_count < 650,
        "quick memo too long: {} words",
        output.stats.word_count
    );
    assert!(
        output.recommendation.is_some(),
        "no Proceed/Watch/Pass in:\n{}",
        output.markdown
    );
    assert!(output.markdown.contains("Acme"), "company was renamed");

    let paths = write_artifacts(&output, output_dir()).await.unwrap();
    assert!(paths.markdown.ends_with("Acme_investment_memo.md"));
    assert!(std::fs::read(&paths.pdf).unwrap().starts_with(b"%PDF"));
    println!(
        "acme quick: {} words, {:?}, {}ms",
        output.stats.word_count, output.recommendation, output.stats.total_duration_ms
    );
}

#[tokio::test]
async fn e2e_full_with_optional_deck() {
    let credentials = e2e_skip_unless_ready!();
    let config = live_config(credentials, MemoMode::Full);
    let mut form = FormInput::new(
        "Kora Ledger",
        "Bookkeeping app for informal retailers in Lagos, priced per store per month.",
        "Former product lead at a payments company; two prior failed startups.",
    );
    form.sector = "Fintech".into();
    form.geography = "Nigeria".into();
    form.traction = "120 paying stores, 8% monthly churn".into();

    let deck = std::env::var("E2E_DECK").ok().map(|p| DeckSource::parse(&p));
    let output = generate_memo(&form, deck, &config)
        .await
        .expect("full memo should succeed");

    assert_memo_quality(&output.markdown, "full");
    assert!(output.recommendation.is_some());
    if let Some(ref w) = output.deck.warning {
        println!("deck degraded: {w}");
    }
    write_artifacts(&output, output_dir()).await.unwrap();
    println!(
        "full: {} words, {} prompt chars, deck chars {}",
        output.stats.word_count, output.stats.prompt_chars, output.deck.chars_used
    );
}
