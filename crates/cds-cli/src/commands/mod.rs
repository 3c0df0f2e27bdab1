pub mod check;
pub mod plan;
pub mod run;
pub mod summarize;

use std::path::{Path, PathBuf};

use cds_core::errors::SurveyError;

use crate::config::SurveyConfig;

/// Loads the config file (if any) and applies the `--data` override.
pub(crate) fn resolve_config(
    config: Option<&Path>,
    data: Option<&PathBuf>,
) -> Result<SurveyConfig, SurveyError> {
    let mut config = SurveyConfig::load_or_default(config)?;
    if let Some(data) = data {
        config.data_path = Some(data.clone());
    }
    Ok(config)
}
