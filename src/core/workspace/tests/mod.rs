mod files;
mod history;
mod structure;

use std::sync::Arc;

use serde_json::{Value, json};

use crate::core::logbook::Logbook;
use crate::core::workspace::WorkspaceService;

fn service() -> WorkspaceService {
    WorkspaceService::new(Arc::new(Logbook::new()))
}

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}
