use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use cds_bank::{load_questions, ValidationReport};
use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::to_canonical_json_bytes;
use clap::Args;
use tracing::warn;

use super::resolve_config;

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Question bank (CSV or JSON).
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// YAML survey configuration supplying the vocabulary.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let report = validate(args)?;
    io::stdout().write_all(&to_canonical_json_bytes(&report)?)?;
    if !report.is_clean() {
        return Err(Box::new(SurveyError::MalformedRecord(
            ErrorInfo::new("bank-check", "question bank has issues")
                .with_context("issues", report.issues.len().to_string()),
        )));
    }
    Ok(())
}

pub fn validate(args: &CheckArgs) -> Result<ValidationReport, SurveyError> {
    let config = resolve_config(args.config.as_deref(), args.data.as_ref())?;
    config.validate()?;
    let bank = load_questions(&config.data_path()?)?;
    let report = bank.validate(&config.vocabulary);
    for issue in report.blocking() {
        warn!(
            question = %issue.question_id,
            position = issue.position,
            kind = ?issue.kind,
            "bank issue"
        );
    }
    Ok(report)
}
