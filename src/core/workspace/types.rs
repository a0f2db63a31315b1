use serde_json::{Value, json};

/// Version history cap; the oldest snapshot is evicted beyond this.
pub const MAX_HISTORY: usize = 25;

pub const DEFAULT_SCHEMA_NAME: &str = "DataSchema";

/// Draft 2020-12 stub the workspace starts from.
pub fn default_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Generated Schema",
        "type": "object",
        "properties": {}
    })
}

/// An imported JSON file, or a Group when `children` is present
/// (regardless of emptiness). `mapped_content` caches the AI mapping of
/// this file onto the current schema and is cleared on every commit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JsonFile {
    pub id: String,
    pub name: String,
    pub content: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<JsonFile>>,
}

impl JsonFile {
    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }
}

/// Immutable snapshot of the document as it was before a commit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaVersion {
    pub id: String,
    pub timestamp_ms: u64,
    pub schema: Value,
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

/// At most one at a time; a cut-mode paste consumes it.
#[derive(Debug, Clone)]
pub struct Clipboard {
    pub mode: ClipboardMode,
    pub path: Vec<String>,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImprovementCategory {
    Naming,
    Structure,
    Type,
    Documentation,
    Optimization,
    Validation,
    Extension,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SchemaImprovement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ImprovementCategory,
}
