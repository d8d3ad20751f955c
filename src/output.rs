//! Result types returned by [`crate::generate_memo`].

use crate::config::MemoMode;
use crate::error::DeckWarning;
use crate::pipeline::extract::{DeckExtract, DeckStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix shared by both artifact file names.
pub const ARTIFACT_SUFFIX: &str = "_investment_memo";

/// A finished memo and everything needed to export it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoOutput {
    pub startup_name: String,
    pub mode: MemoMode,
    /// Cleaned memo; the Markdown artifact verbatim.
    pub markdown: String,
    /// Rendered PDF artifact.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub deck: DeckReport,
    /// Last Proceed / Watch / Pass verdict found in the memo.
    pub recommendation: Option<Recommendation>,
    pub stats: MemoStats,
}

impl MemoOutput {
    /// `<startup_name>_investment_memo.md`
    pub fn markdown_file_name(&self) -> String {
        artifact_file_name(&self.startup_name, "md")
    }

    /// `<startup_name>_investment_memo.pdf`
    pub fn pdf_file_name(&self) -> String {
        artifact_file_name(&self.startup_name, "pdf")
    }

    /// True when the deck was supplied but could not be used.
    pub fn deck_degraded(&self) -> bool {
        self.deck.warning.is_some()
    }
}

/// What happened to the pitch deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckReport {
    pub provided: bool,
    pub pages_used: usize,
    pub chars_used: usize,
    pub truncated: bool,
    /// Set in degraded mode: the memo relies on written inputs only.
    pub warning: Option<DeckWarning>,
}

impl DeckReport {
    pub fn from_extract(extract: &DeckExtract) -> Self {
        let chars_used = extract.text.chars().count();
        match &extract.status {
            DeckStatus::NotProvided => Self::default(),
            DeckStatus::Extracted { pages, truncated } => Self {
                provided: true,
                pages_used: *pages,
                chars_used,
                truncated: *truncated,
                warning: None,
            },
            DeckStatus::Degraded(w) => Self {
                provided: true,
                warning: Some(w.clone()),
                ..Self::default()
            },
        }
    }
}

/// Run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoStats {
    pub prompt_chars: usize,
    pub word_count: usize,
    pub input_tokens: Option<usize>,
    pub output_tokens: Option<usize>,
    /// Characters replaced with `?` in the PDF artifact.
    pub pdf_substituted_chars: usize,
    pub pdf_bytes: usize,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Investment verdict requested by both templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Proceed,
    Watch,
    Pass,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Proceed => f.write_str("Proceed"),
            Recommendation::Watch => f.write_str("Watch"),
            Recommendation::Pass => f.write_str("Pass"),
        }
    }
}

static RE_VERDICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(Proceed|Watch|Pass)\b").unwrap());

/// A verdict word directly after a `Recommendation` / `Verdict` label,
/// allowing an echoed `(Proceed / Watch / Pass)` and markdown bold between.
static RE_LABELLED_VERDICT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:recommendation|verdict)\b\s*(?:\([^)]*\))?\s*[:\-]?\s*\**\s*\b(proceed|watch|pass)\b",
    )
    .unwrap()
});

impl Recommendation {
    /// The verdict stated in `memo`.
    ///
    /// The last word following a `Recommendation:` or `Verdict:` label wins,
    /// so prose after the verdict ("we would Proceed if...") does not flip
    /// it. Without a label, the last standalone verdict word is used; memos
    /// restate the options before committing.
    pub fn detect(memo: &str) -> Option<Self> {
        let labelled = RE_LABELLED_VERDICT
            .captures_iter(memo)
            .last()
            .and_then(|c| c.get(1));
        labelled
            .or_else(|| RE_VERDICT.find_iter(memo).last())
            .map(|m| Self::from_word(m.as_str()))
    }

    fn from_word(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "proceed" => Recommendation::Proceed,
            "watch" => Recommendation::Watch,
            _ => Recommendation::Pass,
        }
    }
}

/// `<name>_investment_memo.<ext>`, with path separators and control
/// characters in the name replaced by `_`.
pub fn artifact_file_name(startup_name: &str, ext: &str) -> String {
    let safe: String = startup_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("{safe}{ARTIFACT_SUFFIX}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names() {
        assert_eq!(artifact_file_name("Acme", "md"), "Acme_investment_memo.md");
        assert_eq!(artifact_file_name(" Acme ", "pdf"), "Acme_investment_memo.pdf");
        assert_eq!(artifact_file_name("A/B\\C", "md"), "A_B_C_investment_memo.md");
    }

    #[test]
    fn detects_final_verdict() {
        let memo = "Options: Proceed / Watch / Pass.\n\nFinal Recommendation: Watch";
        assert_eq!(Recommendation::detect(memo), Some(Recommendation::Watch));
    }

    #[test]
    fn ignores_verdict_words_inside_other_words() {
        assert_eq!(Recommendation::detect("Passionate founders, Watchful investors"), None);
        assert_eq!(Recommendation::detect("We Pass."), Some(Recommendation::Pass));
    }

    #[test]
    fn labelled_verdict_beats_later_prose() {
        assert_eq!(
            Recommendation::detect("Verdict: Watch. We would Proceed if churn halves."),
            Some(Recommendation::Watch)
        );
        assert_eq!(
            Recommendation::detect("**Final Recommendation:** Pass\n\nA Watch list entry may follow."),
            Some(Recommendation::Pass)
        );
        assert_eq!(
            Recommendation::detect("## Final Recommendation (Proceed / Watch / Pass)\n\nProceed, then Watch burn."),
            Some(Recommendation::Proceed)
        );
    }

    #[test]
    fn deck_report_from_degraded_extract() {
        let extract = DeckExtract::degraded(DeckWarning::NoText { name: "d.pdf".into() });
        let report = DeckReport::from_extract(&extract);
        assert!(report.provided);
        assert!(report.warning.is_some());
        assert_eq!(report.chars_used, 0);
    }

    #[test]
    fn deck_report_without_deck() {
        let report = DeckReport::from_extract(&DeckExtract::default());
        assert!(!report.provided);
        assert!(report.warning.is_none());
    }
}
