use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cds_core::errors::SurveyError;
use cds_core::{stable_hash_string, FollowUpCode, FollowUpVocabulary, QuestionRecord};
use serde::{Deserialize, Serialize};

/// Immutable, loaded question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<PathBuf>,
}

impl QuestionBank {
    pub fn new(questions: Vec<QuestionRecord>, source: Option<PathBuf>) -> Self {
        Self { questions, source }
    }

    pub fn from_questions(questions: Vec<QuestionRecord>) -> Self {
        Self::new(questions, None)
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// SHA-256 over the canonical JSON of the questions, independent of
    /// where the bank was loaded from.
    pub fn fingerprint(&self) -> Result<String, SurveyError> {
        stable_hash_string(&self.questions)
    }

    /// Checks the bank against the follow-up vocabulary.
    pub fn validate(&self, vocabulary: &FollowUpVocabulary) -> ValidationReport {
        let mut issues = Vec::new();
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (position, question) in self.questions.iter().enumerate() {
            match seen.get(question.id.as_str()) {
                Some(&first) => issues.push(BankIssue {
                    question_id: question.id.clone(),
                    position,
                    kind: IssueKind::DuplicateId {
                        first_position: first,
                    },
                }),
                None => {
                    seen.insert(question.id.as_str(), position);
                }
            }
            if question.correct_answer.is_empty() {
                issues.push(BankIssue {
                    question_id: question.id.clone(),
                    position,
                    kind: IssueKind::MissingAnswer,
                });
            } else if !vocabulary.contains(&question.correct_answer) {
                issues.push(BankIssue {
                    question_id: question.id.clone(),
                    position,
                    kind: IssueKind::UnknownAnswerCode {
                        code: question.correct_answer.clone(),
                    },
                });
            }
            for (field, text) in [
                ("endoscopy_report", &question.endoscopy_report),
                ("pathology_report", &question.pathology_report),
                ("llm_suggestion", &question.llm_suggestion),
            ] {
                if text.trim().is_empty() {
                    issues.push(BankIssue {
                        question_id: question.id.clone(),
                        position,
                        kind: IssueKind::EmptyText {
                            field: field.to_string(),
                        },
                    });
                }
            }
        }
        ValidationReport {
            questions: self.len(),
            issues,
        }
    }
}

/// Outcome of [`QuestionBank::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub questions: usize,
    pub issues: Vec<BankIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues that make scoring meaningless for the affected question.
    /// Empty report text is tolerated and only reported.
    pub fn blocking(&self) -> impl Iterator<Item = &BankIssue> {
        self.issues
            .iter()
            .filter(|issue| !matches!(issue.kind, IssueKind::EmptyText { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankIssue {
    pub question_id: String,
    /// 0-based position in the bank.
    pub position: usize,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateId { first_position: usize },
    MissingAnswer,
    UnknownAnswerCode { code: FollowUpCode },
    EmptyText { field: String },
}
