//! Best-effort workspace persistence. A snapshot carries the file list,
//! the schema document, and its name; history, clipboard, and job state
//! are deliberately session-scoped and never written out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::workspace::JsonFile;

const SNAPSHOT_FILE: &str = "workspace_v1.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub files: Vec<JsonFile>,
    pub schema: serde_json::Value,
    #[serde(rename = "schemaName")]
    pub schema_name: String,
}

/// Reads and writes the single snapshot file under a storage directory.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SNAPSHOT_FILE),
        }
    }

    /// Platform data directory, e.g. `~/.local/share/katje` on Linux.
    pub fn default_dir() -> Result<PathBuf> {
        let base = dirs::data_dir().context("no data directory available on this platform")?;
        Ok(base.join("katje"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, snapshot: &WorkspaceSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let serialized =
            serde_json::to_string_pretty(snapshot).context("serializing workspace snapshot")?;
        tokio::fs::write(&self.path, serialized)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        debug!(path = %self.path.display(), "workspace snapshot saved");
        Ok(())
    }

    /// A missing file is a fresh workspace, not an error. A corrupt file
    /// is reported and treated the same way.
    pub async fn load(&self) -> Result<Option<WorkspaceSnapshot>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt snapshot");
                Ok(None)
            }
        }
    }
}
