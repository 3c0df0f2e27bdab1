use serde::{Deserialize, Serialize};

use crate::vocabulary::FollowUpCode;
use crate::{BackgroundCategory, Group, Phase, SetLabel};

/// One question of the bank: a pair of reports, the LLM suggestion and the
/// reference follow-up interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Identifier taken from the `id` column.
    pub id: String,
    /// Free-text endoscopy report.
    #[serde(default)]
    pub endoscopy_report: String,
    /// Free-text pathology report.
    #[serde(default)]
    pub pathology_report: String,
    /// AI-generated follow-up suggestion shown in the assisted condition.
    #[serde(default)]
    pub llm_suggestion: String,
    /// Reference follow-up interval code.
    #[serde(default)]
    pub correct_answer: FollowUpCode,
}

/// A question tagged with the condition it is presented under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialItem {
    /// The underlying bank question.
    pub question: QuestionRecord,
    /// Whether the LLM suggestion is shown.
    pub show_assistance: bool,
    /// Phase the item belongs to.
    pub phase: Phase,
    /// Partition the question was drawn into.
    pub set_label: SetLabel,
}

impl TrialItem {
    /// Identifier of the underlying question.
    pub fn question_id(&self) -> &str {
        &self.question.id
    }

    /// The suggestion text if assistance is shown for this item.
    pub fn visible_suggestion(&self) -> Option<&str> {
        self.show_assistance
            .then_some(self.question.llm_suggestion.as_str())
    }
}

/// Identity and metadata captured by the participant form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Name or study identifier.
    pub name: String,
    /// Reported attending background.
    pub background: BackgroundCategory,
    /// Years as an attending physician (0 if not applicable).
    pub practice_years: u32,
    /// Group drawn at assignment time.
    pub group: Group,
}

/// One answered trial item. Field names in the serialized form are the
/// export column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Participant name snapshot.
    #[serde(rename = "user_name")]
    pub name: String,
    /// Participant background label snapshot.
    pub background: String,
    /// Participant practice years snapshot.
    pub practice_years: u32,
    /// Participant group snapshot.
    #[serde(rename = "participant_group")]
    pub group: Group,
    /// Phase of the answered item.
    pub phase: Phase,
    /// Set of the answered item.
    #[serde(rename = "question_set")]
    pub set_label: SetLabel,
    /// Identifier of the answered question.
    pub question_id: String,
    /// 1-based position of the item in the session sequence.
    #[serde(rename = "question_index_session")]
    pub sequence_index: usize,
    /// Whether the LLM suggestion was shown.
    #[serde(rename = "llm_assisted")]
    pub assistance_shown: bool,
    /// Code chosen by the participant.
    pub selected_answer: FollowUpCode,
    /// Reference code of the question.
    pub correct_answer: FollowUpCode,
    /// Exact equality of the selected and reference codes.
    pub is_correct: bool,
    /// Seconds between the item being shown and the answer being submitted.
    #[serde(rename = "time_taken_seconds")]
    pub elapsed_seconds: f64,
}
