//! Reporting over collected responses: summary statistics, CSV export and
//! the cumulative results registry.

pub mod export;
pub mod summary;

pub use export::{
    append_registry, export_results, read_results, results_filename, sanitize_name,
    unused_path, write_results, RESULTS_PREFIX, RESULT_COLUMNS,
};
pub use summary::{summarize, summarize_by_condition, ConditionSummary, SummaryReport};
