//! Persists the imported rows, finalized layout and active image between runs

use crate::core::{DatasetId, FinalizedLayout, Row};
use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SNAPSHOT_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub dataset_id: Option<DatasetId>,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub layout: FinalizedLayout,
    #[serde(default)]
    pub active_image: Option<String>,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last snapshot; an absent or unreadable file yields `None`
    pub fn load(&self) -> Option<SessionSnapshot> {
        if !self.path.exists() {
            debug!("No saved session at {}", self.path.display());
            return None;
        }
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read saved session {}: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(snapshot) => {
                info!("Restored session from {}", self.path.display());
                Some(snapshot)
            }
            Err(e) => {
                warn!("Discarding unreadable session {}: {e}", self.path.display());
                None
            }
        }
    }

    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string(snapshot)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved session ({} rows) to {}", snapshot.rows.len(), self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
