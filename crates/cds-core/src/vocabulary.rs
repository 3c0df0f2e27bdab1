//! Follow-up interval vocabulary and participant background wording.
//!
//! Both are configuration rather than fixed facts: study sites disagree on the
//! exact code list (the urgent-referral code is optional) and on where the
//! seniority boundary sits, so the defaults below can be replaced wholesale
//! from the survey configuration file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BackgroundCategory;

/// Follow-up interval code such as `3y` or `7-10y`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowUpCode(String);

impl FollowUpCode {
    /// Wraps a raw code without validating it against a vocabulary.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the raw code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code is the empty string (missing cell).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FollowUpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FollowUpCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A code paired with the label offered to participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpOption {
    /// Code stored in responses and compared against the reference answer.
    pub code: FollowUpCode,
    /// Human readable label.
    pub label: String,
}

impl FollowUpOption {
    /// Creates an option from a code and a label.
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: FollowUpCode::new(code),
            label: label.to_string(),
        }
    }
}

/// Ordered list of follow-up options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowUpVocabulary {
    options: Vec<FollowUpOption>,
}

impl FollowUpVocabulary {
    /// Builds a vocabulary from explicit options, preserving their order.
    pub fn new(options: Vec<FollowUpOption>) -> Self {
        Self { options }
    }

    /// Options in presentation order.
    pub fn options(&self) -> &[FollowUpOption] {
        &self.options
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether the vocabulary has no options.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Whether the code belongs to the vocabulary.
    pub fn contains(&self, code: &FollowUpCode) -> bool {
        self.options.iter().any(|option| &option.code == code)
    }

    /// Label for a code, if the code is known.
    pub fn label(&self, code: &FollowUpCode) -> Option<&str> {
        self.options
            .iter()
            .find(|option| &option.code == code)
            .map(|option| option.label.as_str())
    }

    /// Codes appearing more than once, in first-seen order.
    pub fn duplicate_codes(&self) -> Vec<FollowUpCode> {
        let mut seen = Vec::new();
        let mut duplicates = Vec::new();
        for option in &self.options {
            if seen.contains(&&option.code) {
                if !duplicates.contains(&option.code) {
                    duplicates.push(option.code.clone());
                }
            } else {
                seen.push(&option.code);
            }
        }
        duplicates
    }
}

impl Default for FollowUpVocabulary {
    fn default() -> Self {
        Self::new(vec![
            FollowUpOption::new("1y", "1 Year Follow-up"),
            FollowUpOption::new("3y", "3 Years Follow-up"),
            FollowUpOption::new("3-5y", "3-5 Years Follow-up"),
            FollowUpOption::new("5y", "5 Years Follow-up"),
            FollowUpOption::new("7-10y", "7-10 Years Follow-up"),
            FollowUpOption::new("10y", "10 Years Follow-up"),
            FollowUpOption::new("other", "Other"),
            FollowUpOption::new(
                "malignancy",
                "Malignancy found, immediate clinical evaluation recommended",
            ),
        ])
    }
}

/// Form wording for each [`BackgroundCategory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundLabels {
    /// Label for [`BackgroundCategory::SeniorGastroenterologist`].
    pub senior_gastroenterologist: String,
    /// Label for [`BackgroundCategory::JuniorGastroenterologist`].
    pub junior_gastroenterologist: String,
    /// Label for [`BackgroundCategory::NonGastroenterologist`].
    pub non_gastroenterologist: String,
}

impl BackgroundLabels {
    /// Label shown for and exported with the given category.
    pub fn label(&self, category: BackgroundCategory) -> &str {
        match category {
            BackgroundCategory::SeniorGastroenterologist => &self.senior_gastroenterologist,
            BackgroundCategory::JuniorGastroenterologist => &self.junior_gastroenterologist,
            BackgroundCategory::NonGastroenterologist => &self.non_gastroenterologist,
        }
    }
}

impl Default for BackgroundLabels {
    fn default() -> Self {
        Self {
            senior_gastroenterologist: "Senior Gastroenterologist (Attending > 5 years)".into(),
            junior_gastroenterologist: "Junior Gastroenterologist (Attending <= 5 years)".into(),
            non_gastroenterologist:
                "Non-Gastroenterologist (e.g., Intern, Resident, other specialty)".into(),
        }
    }
}
