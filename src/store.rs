//! Draft persistence.
//!
//! The in-progress assessment (answers, consent, medication scan) is cached
//! as a single JSON document so an interrupted session can resume. Saves are
//! atomic: write to a sibling temp file, then rename over the target.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MedicationRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Draft file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Everything a resumed session needs, in one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDraft {
    #[serde(default)]
    pub consent_given: bool,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub raw_meds_text: String,
    #[serde(default)]
    pub meds_rows: Vec<MedicationRecord>,
}

/// Load/save of one draft file. Last writer wins; there is exactly one
/// assessment in flight per data directory.
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Missing file means a fresh draft; a present file must parse.
    pub fn load(&self) -> Result<SessionDraft, StoreError> {
        if !self.path.exists() {
            return Ok(SessionDraft::default());
        }
        let bytes = std::fs::read(&self.path)?;
        let draft = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), "draft loaded");
        Ok(draft)
    }

    pub fn save(&self, draft: &SessionDraft) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(draft)?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, &json)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// Remove the draft after export or an explicit reset.
    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
