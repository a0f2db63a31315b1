use serde_json::{Map, Value, json};

use super::{Clipboard, ClipboardMode, WorkspaceService};
use crate::core::logbook::LogKind;

/// Walk the document from the root, one property-name (or array-index)
/// segment at a time. `None` when any segment is absent or the current
/// value is not indexable.
pub(crate) fn navigate<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

pub(crate) fn navigate_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn object_like(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("object") || node.get("properties").is_some()
}

fn array_like(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("array") || node.get("items").is_some()
}

/// Properties map of a node, created on demand.
fn ensure_properties(node: &mut Value) -> Option<&mut Map<String, Value>> {
    let obj = node.as_object_mut()?;
    if !obj.contains_key("properties") {
        obj.insert("properties".to_string(), json!({}));
    }
    obj.get_mut("properties")?.as_object_mut()
}

fn properties_of(node: &mut Value) -> Option<&mut Map<String, Value>> {
    node.get_mut("properties")?.as_object_mut()
}

/// Infer a schema stub for a JSON fragment by its type.
pub(crate) fn infer_schema_type(value: &Value) -> Value {
    match value {
        Value::Null => json!({"type": "null", "description": "Nullable field"}),
        Value::Array(items) => {
            let inner = items.first().map(infer_schema_type).unwrap_or_else(|| json!({}));
            json!({"type": "array", "description": "List of items", "items": inner})
        }
        Value::Object(_) => json!({"type": "object", "description": "Object container", "properties": {}}),
        Value::Number(_) => json!({"type": "number", "description": "Numeric value"}),
        Value::Bool(_) => json!({"type": "boolean", "description": "Boolean flag"}),
        Value::String(_) => json!({"type": "string", "description": "Text field"}),
    }
}

/// Remove the node at `path` from a draft: index splice for array parents,
/// properties-map removal for schema-object parents, direct key otherwise.
fn delete_in(schema: &mut Value, path: &[String]) {
    let Some((key, parent_path)) = path.split_last() else {
        return;
    };
    let Some(parent) = navigate_mut(schema, parent_path) else {
        return;
    };
    match parent {
        Value::Array(items) => {
            if let Ok(index) = key.parse::<usize>()
                && index < items.len()
            {
                items.remove(index);
            }
        }
        Value::Object(obj) => {
            let in_properties = obj
                .get_mut("properties")
                .and_then(Value::as_object_mut)
                .map(|props| props.remove(key.as_str()).is_some())
                .unwrap_or(false);
            if !in_properties {
                obj.remove(key.as_str());
            }
        }
        _ => {}
    }
}

impl WorkspaceService {
    /// Infer a schema stub for `fragment` and insert it at the target:
    /// object-like targets gain `properties[key]`, array-like targets get
    /// their `items` replaced, an unresolvable path falls back to the root.
    /// A non-container target on a non-empty path is rejected.
    pub async fn add_fragment(&self, fragment: &Value, key: &str, target_path: Option<&[String]>) {
        let mut state = self.state.lock().await;
        let path: Vec<String> = target_path
            .map(|p| p.to_vec())
            .unwrap_or_else(|| state.selected_path.clone());

        let mut draft = state.schema.clone();
        let effective: &[String] = if navigate(&draft, &path).is_some() {
            &path
        } else {
            &[]
        };
        let stub = infer_schema_type(fragment);

        let Some(target) = navigate_mut(&mut draft, effective) else {
            return;
        };
        if object_like(target) {
            let Some(props) = ensure_properties(target) else {
                return;
            };
            props.insert(key.to_string(), stub);
        } else if array_like(target) {
            if let Some(obj) = target.as_object_mut() {
                obj.insert("items".to_string(), stub);
            }
        } else if effective.is_empty() {
            let Some(props) = ensure_properties(target) else {
                self.logbook.record(
                    LogKind::Error,
                    "Cannot add child to non-object node",
                    Value::Null,
                );
                return;
            };
            props.insert(key.to_string(), stub);
        } else {
            self.logbook.record(
                LogKind::Error,
                "Cannot add child to non-object node",
                Value::Null,
            );
            return;
        }

        self.commit_locked(&mut state, draft, &format!("Added node: {key}"));
    }

    /// Insert a structural stub of `type_name` at the selected path.
    pub async fn add_node(&self, type_name: &str, key: &str) {
        let description = format!("Description for {key}");
        let template = match type_name {
            "object" => json!({"type": "object", "description": description, "properties": {}}),
            "array" => json!({"type": "array", "description": description, "items": {}}),
            _ => json!({"type": type_name, "description": description}),
        };

        let mut state = self.state.lock().await;
        let path = state.selected_path.clone();
        let mut draft = state.schema.clone();
        let effective: &[String] = if navigate(&draft, &path).is_some() {
            &path
        } else {
            &[]
        };

        let Some(target) = navigate_mut(&mut draft, effective) else {
            return;
        };
        if target.get("properties").is_some() {
            if let Some(props) = properties_of(target) {
                props.insert(key.to_string(), template);
            }
        } else if target.get("items").is_some() {
            if let Some(obj) = target.as_object_mut() {
                obj.insert("items".to_string(), template);
            }
        } else if effective.is_empty() {
            if let Some(props) = ensure_properties(target) {
                props.insert(key.to_string(), template);
            }
        }

        self.commit_locked(&mut state, draft, &format!("Added {type_name}: {key}"));
    }

    /// Rename a key in its parent's properties, preserving insertion order.
    pub async fn rename_node(&self, path: &[String], new_name: &str) {
        let Some((old_name, parent_path)) = path.split_last() else {
            return;
        };
        let mut state = self.state.lock().await;
        let mut draft = state.schema.clone();

        let Some(parent) = navigate_mut(&mut draft, parent_path) else {
            return;
        };
        let Some(props) = properties_of(parent) else {
            return;
        };
        if !props.contains_key(old_name.as_str()) {
            return;
        }

        let mut rebuilt = Map::new();
        for (k, v) in props.iter() {
            if k == old_name {
                rebuilt.insert(new_name.to_string(), v.clone());
            } else {
                rebuilt.insert(k.clone(), v.clone());
            }
        }
        *props = rebuilt;

        self.commit_locked(
            &mut state,
            draft,
            &format!("Renamed {old_name} to {new_name}"),
        );
    }

    pub async fn delete_node(&self, path: &[String]) {
        if path.is_empty() {
            return;
        }
        let mut state = self.state.lock().await;
        let mut draft = state.schema.clone();

        let parent_path = &path[..path.len() - 1];
        if navigate(&draft, parent_path).is_none() {
            return;
        }
        delete_in(&mut draft, path);

        self.commit_locked(
            &mut state,
            draft,
            &format!("Deleted node at {}", path.join("/")),
        );
    }

    /// Snapshot the node at `path` into the clipboard. The document is not
    /// mutated; the previous clipboard entry, if any, is overwritten.
    pub async fn copy_node(&self, path: &[String], is_cut: bool) {
        let mut state = self.state.lock().await;
        let Some(node) = navigate(&state.schema, path).cloned() else {
            return;
        };
        state.clipboard = Some(Clipboard {
            mode: if is_cut {
                ClipboardMode::Cut
            } else {
                ClipboardMode::Copy
            },
            path: path.to_vec(),
            data: node,
        });
        let title = if is_cut {
            "Node cut to clipboard"
        } else {
            "Node copied to clipboard"
        };
        self.logbook.record(LogKind::Info, title, Value::Null);
    }

    /// Insert the clipboard node under the target's properties. Copy mode
    /// suffixes the key with `_copy` to avoid silently overwriting; cut
    /// mode deletes the original in the same commit and clears the
    /// clipboard.
    pub async fn paste_node(&self, target_path: &[String]) {
        let mut state = self.state.lock().await;
        let Some(clip) = state.clipboard.clone() else {
            return;
        };
        let Some(source_key) = clip.path.last() else {
            return;
        };

        let mut draft = state.schema.clone();
        let Some(props) = navigate_mut(&mut draft, target_path).and_then(properties_of) else {
            self.logbook.record(
                LogKind::Error,
                "Cannot paste into this node type (target must be object properties)",
                Value::Null,
            );
            return;
        };

        let key = match clip.mode {
            ClipboardMode::Copy => format!("{source_key}_copy"),
            ClipboardMode::Cut => source_key.clone(),
        };
        props.insert(key, clip.data.clone());

        if clip.mode == ClipboardMode::Cut {
            delete_in(&mut draft, &clip.path);
            state.clipboard = None;
        }

        self.commit_locked(&mut state, draft, "Pasted node");
    }

    /// Relocate a node under the target's properties. Moving a node onto
    /// itself or into its own descendant would detach the subtree from
    /// itself and is rejected; both the delete and the insert happen
    /// against one draft so a failed target leaves nothing committed.
    pub async fn move_node(&self, source_path: &[String], target_path: &[String]) {
        if source_path.is_empty() {
            return;
        }
        let is_ancestor = target_path.len() >= source_path.len()
            && target_path[..source_path.len()] == *source_path;
        if is_ancestor {
            return;
        }

        let mut state = self.state.lock().await;
        let mut draft = state.schema.clone();
        let Some(node) = navigate(&draft, source_path).cloned() else {
            return;
        };
        delete_in(&mut draft, source_path);

        let key = source_path[source_path.len() - 1].clone();
        match navigate_mut(&mut draft, target_path).and_then(properties_of) {
            Some(props) => {
                props.insert(key.clone(), node);
                self.commit_locked(&mut state, draft, &format!("Moved {key}"));
            }
            None => {
                self.logbook.record(
                    LogKind::Error,
                    "Invalid drop target (must be object properties)",
                    Value::Null,
                );
            }
        }
    }

    pub async fn clipboard_is_empty(&self) -> bool {
        self.state.lock().await.clipboard.is_none()
    }
}
