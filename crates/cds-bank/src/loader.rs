use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::{FollowUpCode, QuestionRecord};
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::bank::QuestionBank;

/// Columns every bank file must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "id",
    "endoscopy_report",
    "pathology_report",
    "llm_suggestion",
    "correct_answer",
];

/// Supported on-disk bank formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankFormat {
    Csv,
    Json,
}

impl BankFormat {
    /// Picks the format from the file extension; anything that is not `.json`
    /// is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => BankFormat::Json,
            _ => BankFormat::Csv,
        }
    }
}

/// Loads the question bank at `path`.
///
/// Missing text cells become empty strings. A missing file is reported as
/// [`SurveyError::MissingDataSource`]; unreadable content or a row without an
/// `id` as [`SurveyError::MalformedRecord`].
pub fn load_questions(path: &Path) -> Result<QuestionBank, SurveyError> {
    debug!(path = %path.display(), "loading question bank");
    let file = File::open(path).map_err(|err| open_error(path, err))?;
    let questions = match BankFormat::from_path(path) {
        BankFormat::Csv => read_csv(file, path)?,
        BankFormat::Json => read_json(file, path)?,
    };
    info!(
        path = %path.display(),
        questions = questions.len(),
        "question bank loaded"
    );
    Ok(QuestionBank::new(questions, Some(path.to_path_buf())))
}

/// Parses CSV bank content from any reader.
pub fn read_csv<R: Read>(reader: R, origin: &Path) -> Result<Vec<QuestionRecord>, SurveyError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| wrap_csv("bank-header", origin, err))?
        .clone();
    let columns = ColumnIndex::resolve(&headers, origin)?;

    let mut questions = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|err| wrap_csv("bank-record", origin, err))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let id = columns.cell(&record, columns.id).trim().to_string();
        if id.is_empty() {
            return Err(row_error(origin, line, "row has no id"));
        }
        questions.push(QuestionRecord {
            id,
            endoscopy_report: columns.cell(&record, columns.endoscopy).to_string(),
            pathology_report: columns.cell(&record, columns.pathology).to_string(),
            llm_suggestion: columns.cell(&record, columns.suggestion).to_string(),
            correct_answer: FollowUpCode::new(columns.cell(&record, columns.answer).trim()),
        });
    }
    Ok(questions)
}

/// Parses a JSON array of question objects from any reader.
pub fn read_json<R: Read>(reader: R, origin: &Path) -> Result<Vec<QuestionRecord>, SurveyError> {
    let rows: Vec<JsonRow> = serde_json::from_reader(reader).map_err(|err| {
        SurveyError::MalformedRecord(
            ErrorInfo::new("bank-json", "question bank is not a JSON array of questions")
                .with_context("path", origin.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let mut questions = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let id = scalar_text(row.id.as_ref()).trim().to_string();
        if id.is_empty() {
            return Err(row_error(origin, idx + 1, "entry has no id"));
        }
        questions.push(QuestionRecord {
            id,
            endoscopy_report: scalar_text(row.endoscopy_report.as_ref()),
            pathology_report: scalar_text(row.pathology_report.as_ref()),
            llm_suggestion: scalar_text(row.llm_suggestion.as_ref()),
            correct_answer: FollowUpCode::new(scalar_text(row.correct_answer.as_ref()).trim()),
        });
    }
    Ok(questions)
}

#[derive(Debug, Deserialize)]
struct JsonRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    endoscopy_report: Option<Value>,
    #[serde(default)]
    pathology_report: Option<Value>,
    #[serde(default)]
    llm_suggestion: Option<Value>,
    #[serde(default)]
    correct_answer: Option<Value>,
}

// Spreadsheet exports often turn numeric ids into numbers.
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

struct ColumnIndex {
    id: usize,
    endoscopy: usize,
    pathology: usize,
    suggestion: usize,
    answer: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, origin: &Path) -> Result<Self, SurveyError> {
        let names: Vec<String> = headers
            .iter()
            .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let find = |column: &str| names.iter().position(|name| name == column);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| find(*column).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(SurveyError::MalformedRecord(
                ErrorInfo::new("bank-columns", "question bank is missing required columns")
                    .with_context("path", origin.display().to_string())
                    .with_context("missing", missing.join(","))
                    .with_hint(format!("expected columns: {}", REQUIRED_COLUMNS.join(","))),
            ));
        }
        // Every lookup succeeded above.
        let position = |column: &str| find(column).unwrap_or_default();
        Ok(Self {
            id: position("id"),
            endoscopy: position("endoscopy_report"),
            pathology: position("pathology_report"),
            suggestion: position("llm_suggestion"),
            answer: position("correct_answer"),
        })
    }

    fn cell<'r>(&self, record: &'r StringRecord, idx: usize) -> &'r str {
        record.get(idx).unwrap_or("")
    }
}

fn open_error(path: &Path, err: io::Error) -> SurveyError {
    if err.kind() == io::ErrorKind::NotFound {
        SurveyError::MissingDataSource(
            ErrorInfo::new("bank-missing", "question file not found")
                .with_context("path", path.display().to_string())
                .with_hint("check that the data file exists next to the survey binary"),
        )
    } else {
        SurveyError::MalformedRecord(
            ErrorInfo::new("bank-open", "failed to open question file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    }
}

fn row_error(origin: &Path, line: usize, message: &str) -> SurveyError {
    SurveyError::MalformedRecord(
        ErrorInfo::new("bank-row", message)
            .with_context("path", origin.display().to_string())
            .with_context("line", line.to_string()),
    )
}

fn wrap_csv(code: &str, origin: &Path, err: csv::Error) -> SurveyError {
    SurveyError::MalformedRecord(
        ErrorInfo::new(code, "failed to read question bank")
            .with_context("path", origin.display().to_string())
            .with_hint(err.to_string()),
    )
}

/// Resolves a bank path relative to the directory holding the running
/// executable. Absolute paths are returned unchanged.
pub fn resolve_beside_executable(path: &Path) -> Result<PathBuf, SurveyError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let exe = std::env::current_exe().map_err(|err| {
        SurveyError::Config(
            ErrorInfo::new("exe-path", "cannot locate the running executable")
                .with_hint(err.to_string()),
        )
    })?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(path))
}
