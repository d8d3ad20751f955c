//! Prompt templates for investment committee memos.
//!
//! Every prompt string lives here so the grounding constraint is defined once
//! and shared by both templates. Both builders are pure functions from a
//! [`FormInput`] plus the deck extract to an immutable [`Prompt`].

use crate::config::MemoMode;
use crate::form::FormInput;
use std::fmt;

/// Hallucination guard placed at the top of every prompt.
pub const GROUNDING_CONSTRAINT: &str = r#"CRITICAL CONSTRAINT:
You must ONLY use the information explicitly provided below.
Do NOT invent company names, products, traction, founders, numbers, or customers.
If information is missing, explicitly say "Information not provided."
If assumptions are made, clearly label them as assumptions.
Do NOT rename or substitute the company.
The company name is fixed and must be used consistently."#;

/// Hard word ceiling for quick memos.
pub const QUICK_WORD_LIMIT: usize = 500;

/// The six points a quick memo must cover, in order.
pub const QUICK_COVERAGE: [&str; 6] = [
    "What the company does and who pays for it",
    "Why this founder can or cannot win",
    "How big the market could realistically get",
    "Evidence of traction so far",
    "The single biggest risk",
    "Verdict: Proceed, Watch, or Pass, with a one-sentence reason",
];

/// The eleven sections of a full memo, in order.
pub const FULL_SECTIONS: [&str; 11] = [
    "Investment Summary",
    "Company & Product",
    "Founder & Team",
    "Traction & Early Signals",
    "Market Opportunity",
    "Business Model & Monetization",
    "Risks & Concerns",
    "Why This Can Win",
    "Scoring (Market 35%, Founder 30%, Product 20%, Traction 10%, Risk 5%)",
    "Key Open Questions",
    "Final Recommendation (Proceed / Watch / Pass)",
];

const FULL_ROLE: &str = r#"You are a venture capitalist writing an internal investment committee memo.
This memo is meant to persuade skeptical partners, not to summarize facts.

Writing style:
- First-person plural ("we believe", "we are concerned")
- Opinionated and honest
- Include conviction AND doubts
- No consultant or academic tone
- Narrative paragraphs, not bullets
- Explicitly call out uncomfortable or controversial aspects"#;

const FULL_FORMATTING: &str = r#"Formatting rules:
- No tables
- Clear section headers
- Normal numbers (e.g. "$5 million")"#;

const QUICK_ROLE: &str = r#"You are a venture capitalist writing a short first-look screening note for Monday's partner meeting.
Be direct and opinionated. Plain paragraphs, no tables."#;

/// A fully built prompt. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Length in characters, for logging prompt budgets.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the prompt for `mode`.
pub fn build_prompt(form: &FormInput, deck_text: &str, mode: MemoMode) -> Prompt {
    match mode {
        MemoMode::Quick => quick_prompt(form, deck_text),
        MemoMode::Full => full_prompt(form, deck_text),
    }
}

/// Short memo: six fixed points, hard word ceiling, no rubric.
pub fn quick_prompt(form: &FormInput, deck_text: &str) -> Prompt {
    let coverage = numbered(&QUICK_COVERAGE);
    Prompt(format!(
        "{GROUNDING_CONSTRAINT}\n\n\
         {QUICK_ROLE}\n\
         Hard limit: {QUICK_WORD_LIMIT} words. Stop before you reach it.\n\n\
         {inputs}\n\n\
         Cover exactly these points:\n{coverage}\n",
        inputs = render_inputs(form, deck_text),
    ))
}

/// Long memo: eleven sections, weighted scoring rubric, formatting rules.
pub fn full_prompt(form: &FormInput, deck_text: &str) -> Prompt {
    let structure = numbered(&FULL_SECTIONS);
    Prompt(format!(
        "{GROUNDING_CONSTRAINT}\n\n\
         {FULL_ROLE}\n\n\
         {inputs}\n\n\
         Structure:\n{structure}\n\n\
         {FULL_FORMATTING}\n",
        inputs = render_inputs(form, deck_text),
    ))
}

/// Company facts block shared by both templates.
fn render_inputs(form: &FormInput, deck_text: &str) -> String {
    format!(
        "Company Name: {name}\n\n\
         Startup Details:\n\
         Sector: {sector}\n\
         Stage: {stage}\n\
         Geography: {geography}\n\n\
         Founder LinkedIn:\n{linkedin}\n\n\
         Founder Background:\n{background}\n\n\
         Startup Description:\n{description}\n\n\
         Traction:\n{traction}\n\n\
         Business Model:\n{business_model}\n\n\
         Go-To-Market Strategy:\n{gtm}\n\n\
         Pitch Deck Extract (may be incomplete):\n{deck}",
        name = form.startup_name.trim(),
        sector = form.sector,
        stage = form.stage,
        geography = form.geography,
        linkedin = form.founder_linkedin,
        background = form.founder_background,
        description = form.description,
        traction = form.traction,
        business_model = form.business_model,
        gtm = form.gtm_strategy,
        deck = deck_text,
    )
}

fn numbered(items: &[&str]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> FormInput {
        FormInput::new("Acme", "Sells wrenches", "Ex-Snap engineer")
    }

    #[test]
    fn quick_prompt_has_quick_points_only() {
        let p = build_prompt(&acme(), "", MemoMode::Quick);
        for point in QUICK_COVERAGE {
            assert!(p.as_str().contains(point), "missing quick point: {point}");
        }
        for section in FULL_SECTIONS {
            assert!(!p.as_str().contains(section), "quick prompt leaked: {section}");
        }
        assert!(p.as_str().contains("500 words"));
    }

    #[test]
    fn full_prompt_has_sections_only() {
        let p = build_prompt(&acme(), "", MemoMode::Full);
        for section in FULL_SECTIONS {
            assert!(p.as_str().contains(section), "missing section: {section}");
        }
        for point in QUICK_COVERAGE {
            assert!(!p.as_str().contains(point), "full prompt leaked: {point}");
        }
        assert!(p.as_str().contains("No tables"));
    }

    #[test]
    fn both_templates_carry_grounding_constraint() {
        for mode in [MemoMode::Quick, MemoMode::Full] {
            let p = build_prompt(&acme(), "", mode);
            assert!(p.as_str().starts_with(GROUNDING_CONSTRAINT), "{mode:?}");
            assert!(p.as_str().contains("Information not provided"));
        }
    }

    #[test]
    fn inputs_and_deck_are_interpolated() {
        let mut form = acme();
        form.traction = "3 paid pilots".into();
        let p = full_prompt(&form, "Slide 1: Wrenches for everyone");
        let s = p.as_str();
        assert!(s.contains("Company Name: Acme"));
        assert!(s.contains("Sells wrenches"));
        assert!(s.contains("Ex-Snap engineer"));
        assert!(s.contains("3 paid pilots"));
        assert!(s.contains("Stage: Pre-Seed"));
        assert!(s.contains("Slide 1: Wrenches for everyone"));
    }

    #[test]
    fn building_is_deterministic() {
        let a = build_prompt(&acme(), "deck", MemoMode::Quick);
        let b = build_prompt(&acme(), "deck", MemoMode::Quick);
        assert_eq!(a, b);
    }

    #[test]
    fn sections_are_numbered_in_order() {
        let p = full_prompt(&acme(), "");
        assert!(p.as_str().contains("1. Investment Summary"));
        assert!(p.as_str().contains("11. Final Recommendation (Proceed / Watch / Pass)"));
    }
}
