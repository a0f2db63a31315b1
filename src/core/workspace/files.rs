use regex::Regex;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{JsonFile, WorkspaceService};
use crate::core::logbook::LogKind;

/// Heuristic: does this JSON value look like a JSON Schema rather than
/// plain data?
pub fn is_json_schema(json: &Value) -> bool {
    let Some(obj) = json.as_object() else {
        return false;
    };
    if obj.contains_key("$schema") {
        return true;
    }
    if obj.contains_key("definitions") && (obj.contains_key("type") || obj.contains_key("properties")) {
        return true;
    }
    if obj.contains_key("type") && (obj.contains_key("properties") || obj.contains_key("items")) {
        return true;
    }
    if obj.contains_key("title") && obj.get("type").and_then(Value::as_str) == Some("object") {
        return true;
    }
    false
}

/// Content samples for analysis: a leaf yields its own content, a group
/// yields every descendant's content.
pub fn aggregate_content(file: &JsonFile) -> Value {
    let Some(children) = file.children.as_ref() else {
        return file.content.clone();
    };

    fn collect(file: &JsonFile, samples: &mut Vec<Value>) {
        if !file.content.is_null() {
            samples.push(file.content.clone());
        }
        if let Some(children) = file.children.as_ref() {
            for child in children {
                collect(child, samples);
            }
        }
    }

    let mut samples = Vec::new();
    for child in children {
        collect(child, &mut samples);
    }
    if !file.content.is_null() {
        samples.push(file.content.clone());
    }
    Value::Array(samples)
}

fn find_file<'a>(list: &'a [JsonFile], id: &str) -> Option<&'a JsonFile> {
    for file in list {
        if file.id == id {
            return Some(file);
        }
        if let Some(children) = file.children.as_ref()
            && let Some(found) = find_file(children, id)
        {
            return Some(found);
        }
    }
    None
}

fn remove_file(list: &mut Vec<JsonFile>, id: &str) -> Option<JsonFile> {
    if let Some(index) = list.iter().position(|f| f.id == id) {
        return Some(list.remove(index));
    }
    for file in list.iter_mut() {
        if let Some(children) = file.children.as_mut()
            && let Some(removed) = remove_file(children, id)
        {
            return Some(removed);
        }
    }
    None
}

fn flatten(list: &[JsonFile], out: &mut Vec<JsonFile>) {
    for file in list {
        out.push(file.clone());
        if let Some(children) = file.children.as_ref() {
            flatten(children, out);
        }
    }
}

/// Attach `source` to the file with `target_id`: push into an existing
/// group, or wrap a leaf target and the source into a fresh group in
/// place. Returns the source back when the target is not in the tree.
fn attach_to_target(
    list: &mut Vec<JsonFile>,
    target_id: &str,
    mut source: JsonFile,
    group_name: &str,
) -> Option<JsonFile> {
    for i in 0..list.len() {
        if list[i].id == target_id {
            if let Some(children) = list[i].children.as_mut() {
                children.push(source);
            } else {
                let target = list[i].clone();
                list[i] = JsonFile {
                    id: Uuid::new_v4().to_string(),
                    name: group_name.to_string(),
                    content: Value::Null,
                    mapped_content: None,
                    children: Some(vec![target, source]),
                };
            }
            return None;
        }
        if let Some(children) = list[i].children.as_mut() {
            match attach_to_target(children, target_id, source, group_name) {
                None => return None,
                Some(returned) => source = returned,
            }
        }
    }
    Some(source)
}

fn next_group_name(files: &[JsonFile]) -> String {
    let mut flat = Vec::new();
    flatten(files, &mut flat);
    let pattern = Regex::new(r"(?i)^Group (\d+)$").expect("valid regex");
    let mut max = 0u32;
    for file in &flat {
        if let Some(captures) = pattern.captures(&file.name)
            && let Ok(n) = captures[1].parse::<u32>()
            && n > max
        {
            max = n;
        }
    }
    format!("Group {}", max + 1)
}

impl WorkspaceService {
    pub async fn add_file(&self, name: &str, content: Value) -> String {
        let id = Uuid::new_v4().to_string();
        let mut state = self.state.lock().await;
        state.files.push(JsonFile {
            id: id.clone(),
            name: name.to_string(),
            content,
            mapped_content: None,
            children: None,
        });
        drop(state);
        info!(file = name, "file added");
        self.logbook
            .record(LogKind::Info, &format!("File added: {name}"), Value::Null);
        self.notify();
        id
    }

    /// Already-parsed files from the import layer. One file is added
    /// directly; several become a new group.
    pub async fn add_files(&self, batch: Vec<(String, Value)>) {
        if batch.is_empty() {
            return;
        }
        if batch.len() == 1 {
            let (name, content) = batch.into_iter().next().expect("len checked");
            self.add_file(&name, content).await;
            return;
        }

        let mut state = self.state.lock().await;
        let group_name = next_group_name(&state.files);
        let children: Vec<JsonFile> = batch
            .into_iter()
            .map(|(name, content)| JsonFile {
                id: Uuid::new_v4().to_string(),
                name,
                content,
                mapped_content: None,
                children: None,
            })
            .collect();
        let count = children.len();
        state.files.push(JsonFile {
            id: Uuid::new_v4().to_string(),
            name: group_name.clone(),
            content: Value::Null,
            mapped_content: None,
            children: Some(children),
        });
        drop(state);
        self.logbook.record(
            LogKind::Info,
            &format!("Created {group_name} with {count} files"),
            Value::Null,
        );
        self.notify();
    }

    /// Move `source_id` into `target_id`: into the group when the target
    /// is one, otherwise wrapping both into a fresh group. A vanished
    /// target puts the source back at the root.
    pub async fn group_files(&self, target_id: &str, source_id: &str) {
        if target_id == source_id {
            return;
        }
        let mut state = self.state.lock().await;
        let Some(source) = remove_file(&mut state.files, source_id) else {
            return;
        };
        let source_name = source.name.clone();
        let group_name = next_group_name(&state.files);

        match attach_to_target(&mut state.files, target_id, source, &group_name) {
            None => {
                self.logbook.record(
                    LogKind::Info,
                    &format!("Moved {source_name} into a group"),
                    Value::Null,
                );
            }
            Some(orphan) => {
                state.files.push(orphan);
                return;
            }
        }
        drop(state);
        self.notify();
    }

    pub async fn files(&self) -> Vec<JsonFile> {
        self.state.lock().await.files.clone()
    }

    pub async fn all_files_flat(&self) -> Vec<JsonFile> {
        let state = self.state.lock().await;
        let mut out = Vec::new();
        flatten(&state.files, &mut out);
        out
    }

    pub async fn select_file(&self, id: Option<&str>) {
        let mut state = self.state.lock().await;
        state.selected_file_id = id.filter(|s| !s.is_empty()).map(str::to_string);
        drop(state);
        self.notify();
    }

    pub async fn selected_file(&self) -> Option<JsonFile> {
        let state = self.state.lock().await;
        let id = state.selected_file_id.as_deref()?;
        find_file(&state.files, id).cloned()
    }

    /// Cache the AI mapping of a file onto the current schema. Stale by
    /// definition after the next commit, which clears it.
    pub async fn set_mapping(&self, file_id: &str, mapped: Value) {
        let mut state = self.state.lock().await;

        fn set(list: &mut [JsonFile], id: &str, mapped: &Value) -> bool {
            for file in list {
                if file.id == id {
                    file.mapped_content = Some(mapped.clone());
                    return true;
                }
                if let Some(children) = file.children.as_mut()
                    && set(children, id, mapped)
                {
                    return true;
                }
            }
            false
        }

        if set(&mut state.files, file_id, &mapped) {
            drop(state);
            self.notify();
        }
    }

    /// Adopt an imported schema document, naming it after the file.
    pub async fn load_schema(&self, schema: Value, name: &str) {
        self.update_schema(schema, &format!("Loaded schema: {name}")).await;
        let clean = name
            .strip_suffix(".json")
            .or_else(|| name.strip_suffix(".JSON"))
            .unwrap_or(name);
        self.set_schema_name(clean).await;
    }
}
