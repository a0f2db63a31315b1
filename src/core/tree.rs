//! Pure projection of a schema document (or plain JSON data) into a
//! display-oriented node tree. Internal `$ref`s are resolved and inlined
//! per occurrence; combinator schemas become pseudo-nodes wrapping their
//! alternatives.

use serde_json::Value;

const MAX_DESCRIPTION_CHARS: usize = 40;
const MAX_VALUE_PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TreeItem {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeItem>>,
}

impl TreeItem {
    fn leaf(id: &str, label: String) -> Self {
        Self {
            id: id.to_string(),
            label,
            children: None,
        }
    }
}

/// Project a schema document rooted at `root`.
pub fn schema_tree(root: &Value) -> TreeItem {
    let mut active_refs = Vec::new();
    convert_schema(root, "root", "Root", root, &mut active_refs)
}

/// Resolve an internal JSON pointer (`#/definitions/address`) by walking
/// the root document. No `~0`/`~1` unescaping is attempted.
fn resolve_pointer<'a>(reference: &str, root: &'a Value) -> Option<&'a Value> {
    let pointer = reference.strip_prefix("#/")?;
    let mut current = root;
    for part in pointer.split('/') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn convert_schema(
    obj: &Value,
    id_path: &str,
    key_name: &str,
    root: &Value,
    active_refs: &mut Vec<String>,
) -> TreeItem {
    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        // Only $ref edges can loop: the document itself is acyclic. A
        // pointer already being expanded on this path stops here.
        if active_refs.iter().any(|r| r == reference) {
            return TreeItem::leaf(id_path, format!("{key_name} (Cyclic Ref: {reference})"));
        }
        return match resolve_pointer(reference, root) {
            Some(resolved) => {
                let ref_name = reference.rsplit('/').next().unwrap_or(reference);
                let label = format!("{key_name} (Ref: {ref_name})");
                active_refs.push(reference.to_string());
                let children = schema_children(resolved, id_path, root, active_refs);
                active_refs.pop();
                TreeItem {
                    id: id_path.to_string(),
                    label,
                    children,
                }
            }
            None => TreeItem::leaf(id_path, format!("{key_name} (Unresolved Ref: {reference})")),
        };
    }

    let node_type = obj.get("type").and_then(Value::as_str).unwrap_or("unknown");
    let mut label = format!("{key_name} ({node_type}");
    if let Some(description) = obj.get("description").and_then(Value::as_str) {
        label.push_str(", ");
        label.push_str(&truncate_with_ellipsis(description, MAX_DESCRIPTION_CHARS));
    }
    label.push(')');

    let children = schema_children(obj, id_path, root, active_refs);
    TreeItem {
        id: id_path.to_string(),
        label,
        children,
    }
}

/// Combinator pseudo-nodes first, then property children spliced directly
/// into the parent (never a synthetic "properties" wrapper), else a single
/// `items` child.
fn schema_children(
    obj: &Value,
    id_path: &str,
    root: &Value,
    active_refs: &mut Vec<String>,
) -> Option<Vec<TreeItem>> {
    let mut children: Option<Vec<TreeItem>> = None;

    for combinator in ["oneOf", "anyOf", "allOf"] {
        if let Some(options) = obj.get(combinator).and_then(Value::as_array) {
            let mut option_nodes = Vec::with_capacity(options.len());
            for (idx, sub) in options.iter().enumerate() {
                option_nodes.push(convert_schema(
                    sub,
                    &format!("{id_path}.{combinator}.{idx}"),
                    &format!("Option {}", idx + 1),
                    root,
                    active_refs,
                ));
            }
            let combo = TreeItem {
                id: format!("{id_path}.{combinator}"),
                label: format!("{combinator} ({} options)", option_nodes.len()),
                children: Some(option_nodes),
            };
            children.get_or_insert_with(Vec::new).push(combo);
        }
    }

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        let out = children.get_or_insert_with(Vec::new);
        for (prop_key, sub) in props {
            // The id path must include 'properties' so node operations
            // addressed by id keep working.
            out.push(convert_schema(
                sub,
                &format!("{id_path}.properties.{prop_key}"),
                prop_key,
                root,
                active_refs,
            ));
        }
    } else if let Some(items) = obj.get("items") {
        children.get_or_insert_with(Vec::new).push(convert_schema(
            items,
            &format!("{id_path}.items"),
            "items",
            root,
            active_refs,
        ));
    }

    children
}

/// Simple converter for plain JSON data values: no refs, no combinators.
pub fn data_tree(value: &Value, id_prefix: &str) -> Vec<TreeItem> {
    let entries: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .map(|(key, child)| {
            let id = format!("{id_prefix}.{key}");
            if child.is_object() || child.is_array() {
                TreeItem {
                    label: key,
                    children: Some(data_tree(child, &id)),
                    id,
                }
            } else {
                let preview: String = child.to_string().chars().take(MAX_VALUE_PREVIEW_CHARS).collect();
                TreeItem::leaf(&id, format!("{key}: {preview}"))
            }
        })
        .collect()
}

fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
