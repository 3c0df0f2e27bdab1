//! Question bank loading, validation and process-wide storage.

pub mod bank;
pub mod loader;
pub mod store;

pub use bank::{BankIssue, IssueKind, QuestionBank, ValidationReport};
pub use loader::{
    load_questions, read_csv, read_json, resolve_beside_executable, BankFormat, REQUIRED_COLUMNS,
};
pub use store::BankStore;

/// Bank file looked up next to the survey binary when nothing else is given.
pub const DEFAULT_DATA_FILE: &str = "data/llm_cfs_report_questions.csv";
