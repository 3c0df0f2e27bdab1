use std::fs;
use std::path::Path;

use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::{from_json_slice, to_canonical_json_bytes};
use cds_core::{Group, ParticipantInfo, ResponseRecord, TrialItem};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assign::SplitKind;
use crate::clock::Clock;
use crate::session::{Session, SessionState, SurveyProtocol};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable state of a [`Session`], minus its clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub protocol: SurveyProtocol,
    pub group: Group,
    pub split: SplitKind,
    pub items: Vec<TrialItem>,
    #[serde(default)]
    pub participant: Option<ParticipantInfo>,
    pub state: SessionState,
    pub index: usize,
    #[serde(default)]
    pub responses: Vec<ResponseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halt: Option<SurveyError>,
}

/// Outcome of [`Session::resume`].
#[derive(Debug)]
pub struct Resumed<C: Clock> {
    pub session: Session<C>,
    /// Set when the snapshot index had to be reset.
    pub recovered: Option<SurveyError>,
}

impl SessionSnapshot {
    pub fn save(&self, path: &Path) -> Result<(), SurveyError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                SurveyError::Serde(
                    ErrorInfo::new("snapshot-dir", "failed to create snapshot directory")
                        .with_context("path", parent.display().to_string())
                        .with_hint(err.to_string()),
                )
            })?;
        }
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| {
            SurveyError::Serde(
                ErrorInfo::new("snapshot-write", "failed to write session snapshot")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        debug!(path = %path.display(), index = self.index, "snapshot saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SurveyError> {
        let bytes = fs::read(path).map_err(|err| {
            SurveyError::Serde(
                ErrorInfo::new("snapshot-read", "failed to read session snapshot")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        let snapshot: SessionSnapshot = from_json_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SurveyError::Serde(
                ErrorInfo::new("snapshot-version", "unsupported snapshot version")
                    .with_context("version", snapshot.version.to_string())
                    .with_context("expected", SNAPSHOT_VERSION.to_string()),
            ));
        }
        Ok(snapshot)
    }
}
