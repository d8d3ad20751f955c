//! Pitch-deck text extraction via `pdf-extract`.
//!
//! `pdf_extract` can panic on malformed input instead of returning an error,
//! so every call is wrapped in [`std::panic::catch_unwind`] and run on the
//! blocking pool. Any failure becomes a [`DeckWarning`]; the caller carries on
//! with the written inputs.

use crate::error::{DeckWarning, MemoError};
use crate::pipeline::deck::DeckPayload;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Text pulled from the deck, bounded by the configured cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckExtract {
    /// Empty unless `status` is [`DeckStatus::Extracted`].
    pub text: String,
    pub status: DeckStatus,
}

/// Outcome of the deck stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckStatus {
    /// The user did not supply a deck.
    #[default]
    NotProvided,
    /// Text was extracted from `pages` non-empty pages.
    Extracted { pages: usize, truncated: bool },
    /// The deck could not be used.
    Degraded(DeckWarning),
}

impl DeckExtract {
    pub fn degraded(warning: DeckWarning) -> Self {
        Self {
            text: String::new(),
            status: DeckStatus::Degraded(warning),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, DeckStatus::Degraded(_))
    }

    pub fn warning(&self) -> Option<&DeckWarning> {
        match &self.status {
            DeckStatus::Degraded(w) => Some(w),
            _ => None,
        }
    }
}

/// Extract and truncate the deck's text on the blocking pool.
pub async fn extract_deck(payload: DeckPayload, char_cap: usize) -> Result<DeckExtract, MemoError> {
    tokio::task::spawn_blocking(move || extract_deck_blocking(&payload, char_cap))
        .await
        .map_err(|e| MemoError::Internal(format!("Deck extraction task panicked: {}", e)))
}

/// Blocking implementation of deck extraction.
pub fn extract_deck_blocking(payload: &DeckPayload, char_cap: usize) -> DeckExtract {
    let pages = match extract_pages(&payload.bytes) {
        Ok(pages) => pages,
        Err(detail) => {
            warn!("Deck '{}' unreadable: {}", payload.name, detail);
            return DeckExtract::degraded(DeckWarning::Unreadable {
                name: payload.name.clone(),
                detail,
            });
        }
    };
    debug!("Deck '{}': {} pages parsed", payload.name, pages.len());

    let extract = join_pages(&pages, char_cap);
    if extract.text.trim().is_empty() {
        warn!("Deck '{}' has no extractable text", payload.name);
        return DeckExtract::degraded(DeckWarning::NoText {
            name: payload.name.clone(),
        });
    }

    info!(
        "Deck '{}': {} chars extracted{}",
        payload.name,
        extract.text.chars().count(),
        if matches!(extract.status, DeckStatus::Extracted { truncated: true, .. }) {
            " (truncated)"
        } else {
            ""
        }
    );
    extract
}

/// Concatenate non-empty pages, each followed by a newline, then cut to
/// `char_cap` characters.
pub fn join_pages(pages: &[String], char_cap: usize) -> DeckExtract {
    let mut text = String::new();
    let mut used = 0usize;
    for page in pages.iter().filter(|p| !p.is_empty()) {
        text.push_str(page);
        text.push('\n');
        used += 1;
    }

    let truncated = text.chars().count() > char_cap;
    if truncated {
        text = text.chars().take(char_cap).collect();
    }

    DeckExtract {
        text,
        status: DeckStatus::Extracted {
            pages: used,
            truncated,
        },
    }
}

fn extract_pages(data: &[u8]) -> Result<Vec<String>, String> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(format!("PDF extraction failed: {e}")),
        Err(_) => Err("PDF extraction panicked (malformed document)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_pages_contribute_nothing() {
        let e = join_pages(&pages(&["Problem", "", "Solution"]), 6000);
        assert_eq!(e.text, "Problem\nSolution\n");
        assert_eq!(
            e.status,
            DeckStatus::Extracted {
                pages: 2,
                truncated: false
            }
        );
    }

    #[test]
    fn text_is_truncated_to_cap() {
        let long = "x".repeat(5000);
        let e = join_pages(&pages(&[&long, &long, &long]), 2000);
        assert_eq!(e.text.chars().count(), 2000);
        assert!(matches!(e.status, DeckStatus::Extracted { truncated: true, .. }));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let page = "é".repeat(3000);
        let e = join_pages(&pages(&[&page]), 2000);
        assert_eq!(e.text.chars().count(), 2000);
        assert!(e.text.chars().all(|c| c == 'é'));
    }

    #[test]
    fn cap_holds_for_any_page_mix() {
        for n in [0usize, 1, 7, 40] {
            let ps: Vec<String> = (0..n).map(|i| "slide ".repeat(i * 50)).collect();
            for cap in [2000usize, 3000, 10_000] {
                let e = join_pages(&ps, cap);
                assert!(e.text.chars().count() <= cap, "n={n} cap={cap}");
            }
        }
    }

    #[test]
    fn garbage_bytes_degrade_instead_of_failing() {
        let payload = DeckPayload {
            name: "broken.pdf".into(),
            bytes: b"%PDF-1.4\nthis is not really a pdf".to_vec(),
        };
        let e = extract_deck_blocking(&payload, 6000);
        assert!(e.is_degraded());
        assert!(e.text.is_empty());
    }

    #[test]
    fn rendered_pdf_round_trips_through_extraction() {
        use crate::pipeline::render::{render_memo_pdf, to_pdf_safe};

        let text = to_pdf_safe("Slide one Wrenchco revenue grew forty percent\nSlide two Zanzibar launch");
        let payload = DeckPayload {
            name: "deck.pdf".into(),
            bytes: render_memo_pdf(&text, "Wrenchco deck").unwrap(),
        };
        let e = extract_deck_blocking(&payload, 6000);
        assert_eq!(
            e.status,
            DeckStatus::Extracted {
                pages: 1,
                truncated: false
            }
        );
        assert!(e.text.contains("Wrenchco"), "got: {:?}", e.text);
        assert!(e.text.contains("Zanzibar"), "got: {:?}", e.text);
    }
}
