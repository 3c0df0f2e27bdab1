#![deny(missing_docs)]
#![doc = "Core data model, errors and randomness policy for the crossover clinical-decision survey."]

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod canonical;
pub mod errors;
pub mod hash;
pub mod rng;
mod types;
pub mod vocabulary;

pub use canonical::{from_json_slice, to_canonical_json_bytes};
pub use errors::{ErrorInfo, SurveyError};
pub use hash::stable_hash_string;
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{ParticipantInfo, QuestionRecord, ResponseRecord, TrialItem};
pub use vocabulary::{BackgroundLabels, FollowUpCode, FollowUpOption, FollowUpVocabulary};

/// Counterbalancing group a participant is randomized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Set A unassisted first, then set B assisted.
    G1,
    /// Set B assisted first, then set A unassisted.
    G2,
}

impl Group {
    /// Both groups in canonical order.
    pub const ALL: [Group; 2] = [Group::G1, Group::G2];

    /// Draws a group uniformly at random.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Group::G1
        } else {
            Group::G2
        }
    }

    /// Returns the label used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::G1 => "G1",
            Group::G2 => "G2",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "G1" => Ok(Group::G1),
            "G2" => Ok(Group::G2),
            other => Err(SurveyError::Config(
                ErrorInfo::new("group-parse", "unknown participant group")
                    .with_context("value", other)
                    .with_hint("expected G1 or G2"),
            )),
        }
    }
}

/// One of the two disjoint partitions of the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SetLabel {
    /// The first partition.
    A,
    /// The second partition.
    B,
}

impl SetLabel {
    /// Returns the label used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SetLabel::A => "A",
            SetLabel::B => "B",
        }
    }
}

impl fmt::Display for SetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequential block of trial items; serialized as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Phase {
    /// The first block.
    One,
    /// The second block.
    Two,
}

impl Phase {
    /// Returns the 1-based phase number.
    pub fn number(&self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase.number()
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Phase::One),
            2 => Ok(Phase::Two),
            other => Err(format!("phase must be 1 or 2, got {other}")),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Attending background reported on the participant form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCategory {
    /// Gastroenterology attending beyond the seniority boundary.
    SeniorGastroenterologist,
    /// Gastroenterology attending within the seniority boundary.
    JuniorGastroenterologist,
    /// Intern, resident or another specialty.
    NonGastroenterologist,
}

impl BackgroundCategory {
    /// All categories in the order they are offered on the form.
    pub const ALL: [BackgroundCategory; 3] = [
        BackgroundCategory::SeniorGastroenterologist,
        BackgroundCategory::JuniorGastroenterologist,
        BackgroundCategory::NonGastroenterologist,
    ];
}
