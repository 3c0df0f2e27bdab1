use std::fs;
use std::path::{Path, PathBuf};

use cds_bank::{resolve_beside_executable, DEFAULT_DATA_FILE};
use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::{BackgroundLabels, FollowUpVocabulary};
use cds_trial::{DesignParams, SurveyProtocol};
use serde::{Deserialize, Serialize};

/// YAML-configurable settings for a survey deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Question bank; defaults to the data file next to the executable.
    pub data_path: Option<PathBuf>,
    /// Directory receiving per-participant exports and manifests.
    pub output_dir: PathBuf,
    /// Cumulative results file appended after every session.
    pub registry_path: Option<PathBuf>,
    /// When set, the session is snapshotted here after every answer.
    pub snapshot_dir: Option<PathBuf>,
    pub design: DesignParams,
    pub vocabulary: FollowUpVocabulary,
    pub backgrounds: BackgroundLabels,
    #[serde(default = "default_max_practice_years")]
    pub max_practice_years: u32,
    /// Master seed for reproducible pilots. Production runs leave it unset.
    pub seed: Option<u64>,
}

fn default_max_practice_years() -> u32 {
    50
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            output_dir: PathBuf::from("results"),
            registry_path: None,
            snapshot_dir: None,
            design: DesignParams::default(),
            vocabulary: FollowUpVocabulary::default(),
            backgrounds: BackgroundLabels::default(),
            max_practice_years: default_max_practice_years(),
            seed: None,
        }
    }
}

impl SurveyConfig {
    pub fn load(path: &Path) -> Result<Self, SurveyError> {
        let text = fs::read_to_string(path).map_err(|err| {
            SurveyError::Config(
                ErrorInfo::new("config-read", "failed to read configuration file")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        let config: SurveyConfig = serde_yaml::from_str(&text).map_err(|err| {
            SurveyError::Config(
                ErrorInfo::new("config-parse", "configuration is not valid YAML")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SurveyError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), SurveyError> {
        self.design.validate()?;
        if self.vocabulary.is_empty() {
            return Err(SurveyError::Config(
                ErrorInfo::new("config-vocabulary", "follow-up vocabulary is empty")
                    .with_hint("list at least one option under `vocabulary`"),
            ));
        }
        let duplicates = self.vocabulary.duplicate_codes();
        if !duplicates.is_empty() {
            let codes: Vec<&str> = duplicates.iter().map(|code| code.as_str()).collect();
            return Err(SurveyError::Config(
                ErrorInfo::new("config-vocabulary", "follow-up codes must be unique")
                    .with_context("duplicates", codes.join(",")),
            ));
        }
        Ok(())
    }

    /// Resolved question bank location.
    pub fn data_path(&self) -> Result<PathBuf, SurveyError> {
        match &self.data_path {
            Some(path) => Ok(path.clone()),
            None => resolve_beside_executable(Path::new(DEFAULT_DATA_FILE)),
        }
    }

    pub fn protocol(&self) -> SurveyProtocol {
        SurveyProtocol {
            vocabulary: self.vocabulary.clone(),
            backgrounds: self.backgrounds.clone(),
            max_practice_years: self.max_practice_years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: SurveyConfig = serde_yaml::from_str(
            "output_dir: out\ndesign:\n  set_a_size: 10\nseed: 99\n",
        )
        .expect("parse");
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.design.set_a_size, 10);
        assert_eq!(config.design.balanced_threshold, 50);
        assert_eq!(config.max_practice_years, 50);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.vocabulary.len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_vocabulary_replaces_default() {
        let config: SurveyConfig = serde_yaml::from_str(
            "vocabulary:\n  - code: 3y\n    label: Three years\n  - code: 3y\n    label: Again\n",
        )
        .expect("parse");
        let err = config.validate().expect_err("duplicate codes");
        assert_eq!(err.info().code, "config-vocabulary");
    }
}
