use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::now_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Error,
    Request,
    Response,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Error => "error",
            LogKind::Request => "request",
            LogKind::Response => "response",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp_ms: u64,
    pub kind: LogKind,
    pub title: String,
    pub data: Value,
}

/// In-app event log: front-newest entry list broadcast to observers.
/// Recording is fire-and-forget and never affects caller control flow.
pub struct Logbook {
    entries: Mutex<Vec<LogEntry>>,
    tx: broadcast::Sender<Vec<LogEntry>>,
}

impl Default for Logbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Logbook {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            entries: Mutex::new(Vec::new()),
            tx,
        }
    }

    pub fn record(&self, kind: LogKind, title: &str, data: Value) {
        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp_ms: now_millis(),
            kind,
            title: title.to_string(),
            data,
        };
        let snapshot = {
            let Ok(mut entries) = self.entries.lock() else {
                return;
            };
            entries.insert(0, entry);
            entries.clone()
        };
        let _ = self.tx.send(snapshot);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Current snapshot plus a live receiver for subsequent updates.
    pub fn subscribe(&self) -> (Vec<LogEntry>, broadcast::Receiver<Vec<LogEntry>>) {
        let rx = self.tx.subscribe();
        (self.entries(), rx)
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        let _ = self.tx.send(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_are_front_newest() {
        let log = Logbook::new();
        log.record(LogKind::Info, "first", Value::Null);
        log.record(LogKind::Error, "second", json!({"code": 7}));
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "second");
        assert_eq!(entries[0].kind, LogKind::Error);
        assert_eq!(entries[1].title, "first");
    }

    #[tokio::test]
    async fn subscribe_delivers_snapshot_then_updates() {
        let log = Logbook::new();
        log.record(LogKind::Info, "before", Value::Null);
        let (snapshot, mut rx) = log.subscribe();
        assert_eq!(snapshot.len(), 1);

        log.record(LogKind::Request, "after", Value::Null);
        let update = rx.recv().await.unwrap();
        assert_eq!(update.len(), 2);
        assert_eq!(update[0].title, "after");
    }

    #[test]
    fn clear_empties_the_log() {
        let log = Logbook::new();
        log.record(LogKind::Info, "entry", Value::Null);
        log.clear();
        assert!(log.entries().is_empty());
    }
}
