use std::fs;
use std::path::Path;

use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::{to_canonical_json_bytes, Group, ParticipantInfo, SetLabel};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assign::{plan_hash, SplitKind};
use crate::clock::Clock;
use crate::session::Session;

/// JSON sidecar written next to a participant's export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub created_at: String,
    #[serde(default)]
    pub participant: Option<ParticipantInfo>,
    pub group: Group,
    pub split: SplitKind,
    pub set_a_len: usize,
    pub set_b_len: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_fingerprint: Option<String>,
    pub plan_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub answered: usize,
    pub total: usize,
    pub complete: bool,
}

impl SessionManifest {
    /// Describes `session` as of now.
    pub fn from_session<C: Clock>(
        session: &Session<C>,
        bank_fingerprint: Option<String>,
        seed: Option<u64>,
    ) -> Result<Self, SurveyError> {
        let items = session.items();
        let set_a_len = items
            .iter()
            .filter(|item| item.set_label == SetLabel::A)
            .count();
        Ok(Self {
            created_at: Utc::now().to_rfc3339(),
            participant: session.participant().cloned(),
            group: session.group(),
            split: session.split(),
            set_a_len,
            set_b_len: items.len() - set_a_len,
            bank_fingerprint,
            plan_hash: plan_hash(items)?,
            seed,
            answered: session.responses().len(),
            total: items.len(),
            complete: session.is_complete(),
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), SurveyError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                SurveyError::Serde(
                    ErrorInfo::new("manifest-dir", "failed to create manifest directory")
                        .with_context("path", parent.display().to_string())
                        .with_hint(err.to_string()),
                )
            })?;
        }
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| {
            SurveyError::Serde(
                ErrorInfo::new("manifest-write", "failed to write session manifest")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        info!(path = %path.display(), "session manifest written");
        Ok(())
    }
}
