use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::{stable_hash_string, Group, Phase, QuestionRecord, SetLabel, TrialItem};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sizes governing the crossover split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignParams {
    /// Smallest bank that gets the shuffled, fixed-size split.
    pub balanced_threshold: usize,
    /// Number of questions in set A for a balanced split.
    pub set_a_size: usize,
}

impl Default for DesignParams {
    fn default() -> Self {
        Self {
            balanced_threshold: 50,
            set_a_size: 25,
        }
    }
}

impl DesignParams {
    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.set_a_size == 0 || self.set_a_size > self.balanced_threshold {
            return Err(SurveyError::Config(
                ErrorInfo::new(
                    "design-params",
                    "set A size must be between 1 and the balanced threshold",
                )
                .with_context("set_a_size", self.set_a_size.to_string())
                .with_context("balanced_threshold", self.balanced_threshold.to_string()),
            ));
        }
        Ok(())
    }
}

/// How the bank was partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// Shuffled bank, fixed-size set A.
    Balanced,
    /// Bank below the threshold: unshuffled halves.
    Degraded,
}

/// Which set and condition each phase gets for a group.
///
/// | group | phase 1             | phase 2             |
/// |-------|---------------------|---------------------|
/// | G1    | set A, unassisted   | set B, assisted     |
/// | G2    | set B, assisted     | set A, unassisted   |
pub fn phase_plan(group: Group) -> [(Phase, SetLabel, bool); 2] {
    match group {
        Group::G1 => [(Phase::One, SetLabel::A, false), (Phase::Two, SetLabel::B, true)],
        Group::G2 => [(Phase::One, SetLabel::B, true), (Phase::Two, SetLabel::A, false)],
    }
}

/// Ordered trial sequence for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub group: Group,
    pub split: SplitKind,
    pub set_a_len: usize,
    pub set_b_len: usize,
    pub items: Vec<TrialItem>,
}

#[derive(Serialize)]
struct PlanEntry<'a> {
    id: &'a str,
    phase: Phase,
    set: SetLabel,
    assisted: bool,
}

impl Assignment {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn phase_items(&self, phase: Phase) -> impl Iterator<Item = &TrialItem> {
        self.items.iter().filter(move |item| item.phase == phase)
    }

    /// User-facing warning for a degraded split.
    pub fn warning(&self) -> Option<SurveyError> {
        match self.split {
            SplitKind::Balanced => None,
            SplitKind::Degraded => Some(SurveyError::InsufficientData(
                ErrorInfo::new(
                    "design-degraded",
                    format!(
                        "only {} questions found; adjusting group sizes",
                        self.items.len()
                    ),
                )
                .with_context("set_a", self.set_a_len.to_string())
                .with_context("set_b", self.set_b_len.to_string()),
            )),
        }
    }

    /// Hash of the presented order and conditions.
    pub fn plan_hash(&self) -> Result<String, SurveyError> {
        plan_hash(&self.items)
    }
}

pub fn plan_hash(items: &[TrialItem]) -> Result<String, SurveyError> {
    let entries: Vec<PlanEntry<'_>> = items
        .iter()
        .map(|item| PlanEntry {
            id: item.question_id(),
            phase: item.phase,
            set: item.set_label,
            assisted: item.show_assistance,
        })
        .collect();
    stable_hash_string(&entries)
}

/// Partitions the bank into set A and set B.
///
/// Banks at or above the threshold are shuffled once and cut after
/// `set_a_size` items; smaller banks are cut at `floor(n / 2)` in their
/// original order.
pub fn split_bank<R: Rng + ?Sized>(
    bank: &[QuestionRecord],
    params: &DesignParams,
    rng: &mut R,
) -> (Vec<QuestionRecord>, Vec<QuestionRecord>, SplitKind) {
    let mut questions = bank.to_vec();
    let (cut, split) = if questions.len() < params.balanced_threshold {
        (questions.len() / 2, SplitKind::Degraded)
    } else {
        questions.shuffle(rng);
        (params.set_a_size.min(questions.len()), SplitKind::Balanced)
    };
    let set_b = questions.split_off(cut);
    (questions, set_b, split)
}

/// Builds the counterbalanced trial sequence for `group`.
///
/// An empty bank yields an empty sequence; callers must not start a
/// response loop on it.
pub fn assign<R: Rng + ?Sized>(
    bank: &[QuestionRecord],
    group: Group,
    params: &DesignParams,
    rng: &mut R,
) -> Assignment {
    let (set_a, set_b, split) = split_bank(bank, params, rng);
    if split == SplitKind::Degraded && !bank.is_empty() {
        warn!(
            questions = bank.len(),
            threshold = params.balanced_threshold,
            "question bank below balanced size; splitting in half"
        );
    }
    let set_a_len = set_a.len();
    let set_b_len = set_b.len();
    let mut items = Vec::with_capacity(set_a_len + set_b_len);
    for (phase, label, show_assistance) in phase_plan(group) {
        let source = match label {
            SetLabel::A => &set_a,
            SetLabel::B => &set_b,
        };
        items.extend(source.iter().cloned().map(|question| TrialItem {
            question,
            show_assistance,
            phase,
            set_label: label,
        }));
    }
    debug!(%group, set_a = set_a_len, set_b = set_b_len, ?split, "assignment built");
    Assignment {
        group,
        split,
        set_a_len,
        set_b_len,
        items,
    }
}

/// Draws the participant's group and builds their sequence from one RNG.
pub fn plan_session<R: Rng + ?Sized>(
    bank: &[QuestionRecord],
    params: &DesignParams,
    rng: &mut R,
) -> Assignment {
    let group = Group::draw(rng);
    assign(bank, group, params, rng)
}
