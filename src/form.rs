//! Startup screening inputs collected from the user.
//!
//! [`FormInput`] is the request-scoped record every front end fills in. Only
//! three fields are mandatory; everything else may be left empty and the
//! prompt will tell the model to write "Information not provided".

use crate::error::MemoError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Funding stage of the company being screened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FundingStage {
    #[default]
    PreSeed,
    Seed,
}

impl fmt::Display for FundingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundingStage::PreSeed => f.write_str("Pre-Seed"),
            FundingStage::Seed => f.write_str("Seed"),
        }
    }
}

/// Everything the user typed into the screening form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormInput {
    /// Required. Used verbatim in the prompt and in artifact file names.
    pub startup_name: String,
    pub sector: String,
    pub stage: FundingStage,
    pub geography: String,
    /// Required. What the company does and why customers care.
    pub description: String,
    pub founder_linkedin: String,
    /// Required. LinkedIn About + Experience, pasted.
    pub founder_background: String,
    pub traction: String,
    pub business_model: String,
    pub gtm_strategy: String,
}

impl FormInput {
    /// Convenience constructor with the three required fields.
    pub fn new(
        startup_name: impl Into<String>,
        description: impl Into<String>,
        founder_background: impl Into<String>,
    ) -> Self {
        Self {
            startup_name: startup_name.into(),
            description: description.into(),
            founder_background: founder_background.into(),
            ..Default::default()
        }
    }

    /// Names of the required fields that are empty or whitespace-only.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.startup_name.trim().is_empty() {
            missing.push("startup name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.founder_background.trim().is_empty() {
            missing.push("founder background");
        }
        missing
    }

    /// Gate run before any deck parsing or network call.
    pub fn validate(&self) -> Result<(), MemoError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MemoError::Validation { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_form_validates() {
        let form = FormInput::new("Acme", "Sells wrenches", "Ex-Snap engineer");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn every_combination_of_missing_fields_is_rejected() {
        for mask in 1u8..8 {
            let form = FormInput::new(
                if mask & 1 != 0 { "" } else { "Acme" },
                if mask & 2 != 0 { "  " } else { "Sells wrenches" },
                if mask & 4 != 0 { "\n" } else { "Ex-Snap engineer" },
            );
            match form.validate() {
                Err(MemoError::Validation { missing }) => {
                    assert_eq!(missing.len(), mask.count_ones() as usize, "mask {mask}");
                }
                other => panic!("mask {mask}: expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn optional_fields_may_be_empty() {
        let form = FormInput {
            traction: String::new(),
            ..FormInput::new("Acme", "Sells wrenches", "Ex-Snap engineer")
        };
        assert!(form.missing_required().is_empty());
    }

    #[test]
    fn stage_display_matches_form_labels() {
        assert_eq!(FundingStage::PreSeed.to_string(), "Pre-Seed");
        assert_eq!(FundingStage::Seed.to_string(), "Seed");
    }
}
