mod edit;
mod files;
pub mod types;

pub use files::{aggregate_content, is_json_schema};
pub use types::{
    Clipboard, ClipboardMode, DEFAULT_SCHEMA_NAME, ImprovementCategory, JsonFile, MAX_HISTORY,
    SchemaImprovement, SchemaVersion, default_schema,
};

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::sync::{Mutex, broadcast};
use tracing::{error, info};
use uuid::Uuid;

use crate::core::logbook::{LogKind, Logbook};
use crate::core::now_millis;
use crate::core::persist::WorkspaceSnapshot;

pub(crate) struct WorkspaceState {
    pub files: Vec<JsonFile>,
    pub selected_file_id: Option<String>,
    pub schema: Value,
    pub schema_name: String,
    pub selected_path: Vec<String>,
    pub history: Vec<SchemaVersion>,
    pub clipboard: Option<Clipboard>,
    // Improvement suggestions keyed by content fingerprint, so a rename
    // never invalidates and a content change never serves stale entries.
    pub improvements: HashMap<u64, Vec<SchemaImprovement>>,
}

impl WorkspaceState {
    fn fresh() -> Self {
        Self {
            files: Vec::new(),
            selected_file_id: None,
            schema: default_schema(),
            schema_name: DEFAULT_SCHEMA_NAME.to_string(),
            selected_path: Vec::new(),
            history: Vec::new(),
            clipboard: None,
            improvements: HashMap::new(),
        }
    }
}

/// Owns the canonical schema document, its bounded version history, the
/// clipboard, and the imported file list with its mapped-content cache.
/// Every structural operation clones the document, mutates the clone, and
/// commits it; prior snapshots are never aliased by later mutations.
pub struct WorkspaceService {
    state: Mutex<WorkspaceState>,
    tx: broadcast::Sender<()>,
    logbook: Arc<Logbook>,
}

impl WorkspaceService {
    pub fn new(logbook: Arc<Logbook>) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(WorkspaceState::fresh()),
            tx,
            logbook,
        }
    }

    /// Change signal; observers re-read whatever state they render.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    fn notify(&self) {
        let _ = self.tx.send(());
    }

    pub async fn schema(&self) -> Value {
        self.state.lock().await.schema.clone()
    }

    pub async fn schema_name(&self) -> String {
        self.state.lock().await.schema_name.clone()
    }

    pub async fn set_schema_name(&self, name: &str) {
        let mut state = self.state.lock().await;
        state.schema_name = name.to_string();
        drop(state);
        self.notify();
    }

    pub async fn selected_path(&self) -> Vec<String> {
        self.state.lock().await.selected_path.clone()
    }

    pub async fn set_selected_path(&self, path: Vec<String>) {
        self.state.lock().await.selected_path = path;
    }

    pub async fn history(&self) -> Vec<SchemaVersion> {
        self.state.lock().await.history.clone()
    }

    /// Replace the document through the commit pipeline. A proposal that
    /// fails to serialize is rejected with no state change.
    pub async fn update_schema(&self, next: Value, action: &str) {
        let mut state = self.state.lock().await;
        self.commit_locked(&mut state, next, action);
    }

    /// Re-commit a stored snapshot. Restoring is itself a new history
    /// entry; the log is append-only and never rewound.
    pub async fn restore_version(&self, version_id: &str) {
        let mut state = self.state.lock().await;
        let Some(version) = state.history.iter().find(|v| v.id == version_id).cloned() else {
            return;
        };
        let action = format!("Restored version from {}", version.timestamp_ms);
        self.commit_locked(&mut state, version.schema, &action);
    }

    pub(crate) fn commit_locked(&self, state: &mut WorkspaceState, next: Value, action: &str) {
        if let Err(e) = Self::apply_commit(state, next, action) {
            error!(action, error = %e, "schema update rejected");
            self.logbook.record(
                LogKind::Error,
                "Failed to update schema",
                json!({"error": e.to_string(), "action": action}),
            );
            return;
        }
        info!(action, "schema updated");
        self.logbook
            .record(LogKind::Info, &format!("Schema updated: {action}"), Value::Null);
        self.notify();
    }

    fn apply_commit(state: &mut WorkspaceState, next: Value, action: &str) -> Result<()> {
        serde_json::to_string(&next).context("proposed schema is not serializable")?;

        state.history.insert(
            0,
            SchemaVersion {
                id: Uuid::new_v4().to_string(),
                timestamp_ms: now_millis(),
                schema: state.schema.clone(),
                action: action.to_string(),
            },
        );
        state.history.truncate(MAX_HISTORY);

        state.schema = next;
        clear_mapped_content(&mut state.files);
        Ok(())
    }

    // --- Improvement cache ---

    pub async fn cached_improvements(&self) -> Option<Vec<SchemaImprovement>> {
        let state = self.state.lock().await;
        let key = fingerprint(&state.schema);
        state.improvements.get(&key).cloned()
    }

    pub async fn set_cached_improvements(&self, improvements: Vec<SchemaImprovement>) {
        let mut state = self.state.lock().await;
        let key = fingerprint(&state.schema);
        state.improvements.insert(key, improvements);
    }

    pub async fn clear_cached_improvements(&self) {
        let mut state = self.state.lock().await;
        let key = fingerprint(&state.schema);
        state.improvements.remove(&key);
    }

    // --- Workspace lifecycle ---

    pub async fn reset_schema(&self) {
        let mut state = self.state.lock().await;
        state.schema_name = "NewSchema".to_string();
        state.selected_path.clear();
        self.commit_locked(&mut state, default_schema(), "Reset to new empty schema");
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = WorkspaceState::fresh();
        drop(state);
        self.logbook
            .record(LogKind::Info, "Workspace reset to defaults", Value::Null);
        self.notify();
    }

    // --- Persistence hooks (best-effort, driven by the embedder) ---

    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        let state = self.state.lock().await;
        WorkspaceSnapshot {
            files: state.files.clone(),
            schema: state.schema.clone(),
            schema_name: state.schema_name.clone(),
        }
    }

    pub async fn apply_snapshot(&self, snapshot: WorkspaceSnapshot) {
        let mut state = self.state.lock().await;
        state.files = snapshot.files;
        state.schema = snapshot.schema;
        state.schema_name = snapshot.schema_name;
        drop(state);
        self.logbook
            .record(LogKind::Info, "Workspace restored from snapshot", Value::Null);
        self.notify();
    }
}

fn clear_mapped_content(files: &mut [JsonFile]) {
    for file in files {
        file.mapped_content = None;
        if let Some(children) = file.children.as_mut() {
            clear_mapped_content(children);
        }
    }
}

/// Content fingerprint of a document: hash of its canonical serialization.
pub(crate) fn fingerprint(value: &Value) -> u64 {
    let serialized = serde_json::to_string(value).unwrap_or_default();
    let mut hasher = std::hash::DefaultHasher::new();
    serialized.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests;
