//! Post-processing: deterministic cleanup of model-generated memo text.
//!
//! Models (and PDF-derived deck text echoed back by them) emit broken spacing:
//! words split across runs of spaces, numbers detached from their units,
//! paragraphs separated by walls of blank lines. These rules repair that
//! without touching content.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the newline rules see only `\n`.
//! Spacing rules run before the blank-line collapse, and trimming runs last.
//! The spacing rules treat a newline like any other whitespace: a line break
//! between two word characters becomes a single space, so only breaks that
//! sit next to punctuation or markup survive to the blank-line collapse.
//! The whole pass is idempotent: `clean_memo_text(clean_memo_text(x)) ==
//! clean_memo_text(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw completion.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Collapse whitespace runs (newlines included) between two word characters into one space
/// 3. Join a digit to a following letter across any whitespace (`5 x` → `5x`)
/// 4. Collapse 3+ consecutive newlines down to 2
/// 5. Trim leading and trailing whitespace
pub fn clean_memo_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = collapse_intra_word_spacing(&s);
    let s = join_digit_letter(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Number of whitespace-separated words, used for the quick-mode ceiling.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Collapse spacing between word characters ─────────────────────────
//
// Equivalent to replacing `(?<=\w)\s+(?=\w)` with a space; `regex` has no
// lookaround, so the run boundaries are checked by hand.

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn collapse_intra_word_spacing(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !c.is_whitespace() {
            out.push(c);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let run = &chars[start..i];
        let between_words = start > 0
            && i < chars.len()
            && is_word_char(chars[start - 1])
            && is_word_char(chars[i]);

        if between_words {
            out.push(' ');
        } else {
            out.extend(run);
        }
    }

    out
}

// ── Rule 3: Join digit and following letter ──────────────────────────────────

static RE_DIGIT_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)\s+([a-zA-Z])").unwrap());

fn join_digit_letter(input: &str) -> String {
    RE_DIGIT_LETTER.replace_all(input, "$1$2").to_string()
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_collapse_spacing_between_words() {
        assert_eq!(collapse_intra_word_spacing("We   believe\t\tin"), "We believe in");
    }

    #[test]
    fn test_spacing_next_to_punctuation_is_kept() {
        assert_eq!(collapse_intra_word_spacing("end.   Next"), "end.   Next");
        assert_eq!(collapse_intra_word_spacing("-   item"), "-   item");
    }

    #[test]
    fn test_line_breaks_between_words_are_spacing() {
        assert_eq!(collapse_intra_word_spacing("Summary\nWe"), "Summary We");
        assert_eq!(
            collapse_intra_word_spacing("Summary\n\nWe believe"),
            "Summary We believe"
        );
        assert_eq!(collapse_intra_word_spacing("end.\n\nNext"), "end.\n\nNext");
    }

    #[test]
    fn test_join_digit_letter() {
        assert_eq!(join_digit_letter("5 0%"), "5 0%");
        assert_eq!(join_digit_letter("raised 2 M"), "raised 2M");
        assert_eq!(join_digit_letter("5\nmillion"), "5million");
        assert_eq!(join_digit_letter("Q3 2024\n\nThe"), "Q3 2024The");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_clean_trims() {
        assert_eq!(clean_memo_text("\n\n  Memo body \n\n"), "Memo body");
    }

    #[test]
    fn test_clean_full_pipeline() {
        let input = "## Investment   Summary\r\n\r\n\r\n\r\nWe  are  excited.\n\n\n\nRevenue hit 1 2k.";
        let out = clean_memo_text(input);
        assert_eq!(
            out,
            "## Investment Summary We are excited.\n\nRevenue hit 1 2k."
        );
    }

    #[test]
    fn test_clean_merges_wrapped_lines() {
        assert_eq!(
            clean_memo_text("## Investment Summary\nWe believe in Acme\n\nRevenue 5\nmillion"),
            "## Investment Summary We believe in Acme Revenue 5million"
        );
    }

    #[test]
    fn test_no_run_longer_than_two_newlines() {
        let inputs = [
            "a\n\n\nb",
            "a\n\n\n\n\n\n\n\nb\n\n\nc",
            "\n\n\n\nlead",
            "x\r\n\r\n\r\ny",
        ];
        for input in inputs {
            let out = clean_memo_text(input);
            assert!(!out.contains("\n\n\n"), "input {input:?} → {out:?}");
        }
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "Plain text.",
            "We   believe  1 2 a b 3\tc",
            "a \n\n\n b",
            "## Title\r\n\r\n\r\nBody  text 5 0% and 10   x",
            "- bullet  one\n-  bullet two\n\n\n\n\nEnd 7\n\n",
            "Ünïcödé   wörds 3 ä",
            "tabs\t\t\tbetween\t words_and_9 z",
            "1 a 2 b 3 c",
        ];
        for input in inputs {
            let once = clean_memo_text(input);
            let twice = clean_memo_text(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("We believe in\nAcme."), 4);
        assert_eq!(word_count(""), 0);
    }
}
