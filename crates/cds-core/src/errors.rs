//! Errors raised while loading a bank, running a session or writing results.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong, where, and what the operator can do about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Short kebab-case tag such as `bank-missing`; tests and logs match on it.
    pub code: String,
    /// Sentence printed after the `!` marker in the terminal.
    pub message: String,
    /// Paths, row numbers and indices that locate the problem.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Underlying io or parser message, or a suggested fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records `key = value`; a repeated key keeps the last value.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches the underlying cause or a suggested fix.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Failure of any survey operation, grouped by how the caller reacts to it.
///
/// Serialized with a `family` tag so a halted session's snapshot keeps the
/// reason it stopped. [`SurveyError::is_recoverable`] decides between
/// re-prompting and ending the experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SurveyError {
    /// The question bank file does not exist.
    #[error("missing data source: {0}")]
    MissingDataSource(ErrorInfo),
    /// The question bank could not be read or a row is unusable.
    #[error("malformed record: {0}")]
    MalformedRecord(ErrorInfo),
    /// The bank is smaller than the balanced design expects.
    #[error("insufficient data: {0}")]
    InsufficientData(ErrorInfo),
    /// An answer was submitted without a valid selection.
    #[error("invalid submission: {0}")]
    InvalidSubmission(ErrorInfo),
    /// The session index pointed past the end of the trial sequence.
    #[error("index out of range: {0}")]
    IndexOutOfRange(ErrorInfo),
    /// The trial sequence is empty, so no experiment is possible.
    #[error("empty sequence: {0}")]
    EmptySequence(ErrorInfo),
    /// The participant form is incomplete or out of bounds.
    #[error("invalid participant: {0}")]
    InvalidParticipant(ErrorInfo),
    /// An operation was attempted in the wrong session state.
    #[error("invalid state: {0}")]
    InvalidState(ErrorInfo),
    /// Configuration values are inconsistent or unreadable.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization, export and filesystem errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl SurveyError {
    /// Payload carried by every variant.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SurveyError::MissingDataSource(info)
            | SurveyError::MalformedRecord(info)
            | SurveyError::InsufficientData(info)
            | SurveyError::InvalidSubmission(info)
            | SurveyError::IndexOutOfRange(info)
            | SurveyError::EmptySequence(info)
            | SurveyError::InvalidParticipant(info)
            | SurveyError::InvalidState(info)
            | SurveyError::Config(info)
            | SurveyError::Serde(info) => info,
        }
    }

    /// Whether the experiment can carry on after surfacing this error.
    ///
    /// Missing or malformed data, an empty sequence and bad configuration stop
    /// the experiment before the response loop; everything else is reported
    /// and the participant is re-prompted.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SurveyError::InsufficientData(_)
                | SurveyError::InvalidSubmission(_)
                | SurveyError::IndexOutOfRange(_)
                | SurveyError::InvalidParticipant(_)
        )
    }
}
