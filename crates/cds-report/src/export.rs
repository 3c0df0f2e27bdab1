use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::ResponseRecord;
use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Export column order; matches the serialized field names of
/// [`ResponseRecord`].
pub const RESULT_COLUMNS: [&str; 13] = [
    "user_name",
    "background",
    "practice_years",
    "participant_group",
    "phase",
    "question_set",
    "question_id",
    "question_index_session",
    "llm_assisted",
    "selected_answer",
    "correct_answer",
    "is_correct",
    "time_taken_seconds",
];

/// Keeps letters and digits of any script plus `._-`; everything else
/// becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "user".to_string()
    } else {
        cleaned
    }
}

/// File name prefix of every per-participant export.
pub const RESULTS_PREFIX: &str = "study_results_";

/// `study_results_<name>.csv` with the name made filesystem safe.
pub fn results_filename(name: &str) -> String {
    format!("{RESULTS_PREFIX}{}.csv", sanitize_name(name))
}

/// Writes the response log as UTF-8 CSV with a byte-order mark.
pub fn write_results<W: Write>(
    mut writer: W,
    records: &[ResponseRecord],
) -> Result<(), SurveyError> {
    writer
        .write_all(BOM)
        .map_err(|err| wrap_io("results-write", err))?;
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(RESULT_COLUMNS)
        .map_err(|err| wrap_csv("results-write-header", err))?;
    for record in records {
        csv.serialize(record)
            .map_err(|err| wrap_csv("results-write-row", err))?;
    }
    csv.flush().map_err(|err| wrap_io("results-flush", err))?;
    Ok(())
}

/// First of `<stem>.<ext>`, `<stem>_2.<ext>`, `<stem>_3.<ext>`, ... that does
/// not exist in `dir`.
pub fn unused_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut path = dir.join(format!("{stem}.{extension}"));
    let mut copy = 2u32;
    while path.exists() {
        path = dir.join(format!("{stem}_{copy}.{extension}"));
        copy += 1;
    }
    path
}

/// Writes `records` to `<dir>/study_results_<name>.csv` and returns the path.
/// An existing export is never replaced; a repeated name gets a `_2`, `_3`
/// suffix.
pub fn export_results(
    dir: &Path,
    name: &str,
    records: &[ResponseRecord],
) -> Result<PathBuf, SurveyError> {
    ensure_dir(dir)?;
    let stem = format!("{RESULTS_PREFIX}{}", sanitize_name(name));
    let (path, file) = loop {
        let path = unused_path(dir, &stem, "csv");
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            // Taken between the existence check and the open.
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(SurveyError::Serde(
                    ErrorInfo::new("results-create", "failed to create results file")
                        .with_context("path", path.display().to_string())
                        .with_hint(err.to_string()),
                ))
            }
        }
    };
    write_results(BufWriter::new(file), records)?;
    info!(path = %path.display(), rows = records.len(), "results exported");
    Ok(path)
}

/// Reads an export or registry file back into response records.
pub fn read_results(path: &Path) -> Result<Vec<ResponseRecord>, SurveyError> {
    let bytes = fs::read(path).map_err(|err| {
        let code = if err.kind() == ErrorKind::NotFound {
            "results-missing"
        } else {
            "results-read"
        };
        SurveyError::Serde(
            ErrorInfo::new(code, "failed to read results file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let body = bytes.strip_prefix(BOM).unwrap_or(&bytes);
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(body);
    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<ResponseRecord>().enumerate() {
        let record = row.map_err(|err| {
            SurveyError::MalformedRecord(
                ErrorInfo::new("results-row", "results row could not be parsed")
                    .with_context("path", path.display().to_string())
                    .with_context("line", (idx + 2).to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Appends rows to a cumulative results file; the header and BOM are written
/// when the file is created.
pub fn append_registry(path: &Path, records: &[ResponseRecord]) -> Result<(), SurveyError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let fresh = fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| {
            SurveyError::Serde(
                ErrorInfo::new("registry-open", "failed to open results registry")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
    let mut out = BufWriter::new(file);
    if fresh {
        out.write_all(BOM)
            .map_err(|err| wrap_io("registry-write-header", err))?;
    }
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    if fresh {
        writer
            .write_record(RESULT_COLUMNS)
            .map_err(|err| wrap_csv("registry-write-header", err))?;
    }
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| wrap_csv("registry-write-row", err))?;
    }
    writer
        .flush()
        .map_err(|err| wrap_io("registry-flush", err))?;
    info!(path = %path.display(), rows = records.len(), "registry appended");
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), SurveyError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|err| {
        SurveyError::Serde(
            ErrorInfo::new("results-dir", "failed to create output directory")
                .with_context("path", dir.display().to_string())
                .with_hint(err.to_string()),
        )
    })
}

fn wrap_csv(code: &str, err: csv::Error) -> SurveyError {
    SurveyError::Serde(ErrorInfo::new(code, "CSV serialization failed").with_hint(err.to_string()))
}

fn wrap_io(code: &str, err: std::io::Error) -> SurveyError {
    SurveyError::Serde(ErrorInfo::new(code, "write failed").with_hint(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_sanitized_for_filenames() {
        assert_eq!(results_filename("Dr. Chen"), "study_results_Dr._Chen.csv");
        assert_eq!(results_filename("../etc/passwd"), "study_results_.._etc_passwd.csv");
        assert_eq!(results_filename("   "), "study_results_user.csv");
        assert_eq!(sanitize_name("王醫師"), "王醫師");
        assert_eq!(sanitize_name("李 醫師/2"), "李_醫師_2");
    }

    #[test]
    fn unused_path_skips_taken_names() {
        let dir = tempfile::tempdir().expect("tmp");
        assert_eq!(unused_path(dir.path(), "a", "csv"), dir.path().join("a.csv"));
        fs::write(dir.path().join("a.csv"), "").expect("write");
        fs::write(dir.path().join("a_2.csv"), "").expect("write");
        assert_eq!(unused_path(dir.path(), "a", "csv"), dir.path().join("a_3.csv"));
    }
}
