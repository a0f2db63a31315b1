use super::*;

#[tokio::test]
async fn add_fragment_infers_a_number_stub_at_the_root() {
    let ws = service();
    ws.add_fragment(&json!({"x": 1}), "count", None).await;

    let schema = ws.schema().await;
    assert_eq!(
        schema["properties"]["count"],
        json!({"type": "object", "description": "Object container", "properties": {}})
    );

    ws.add_fragment(&json!(42), "answer", None).await;
    assert_eq!(
        ws.schema().await["properties"]["answer"],
        json!({"type": "number", "description": "Numeric value"})
    );
}

#[tokio::test]
async fn add_fragment_infers_array_items_from_the_first_element() {
    let ws = service();
    ws.add_fragment(&json!(["a", "b"]), "tags", None).await;
    assert_eq!(
        ws.schema().await["properties"]["tags"],
        json!({
            "type": "array",
            "description": "List of items",
            "items": {"type": "string", "description": "Text field"}
        })
    );

    ws.add_fragment(&json!([]), "empty", None).await;
    assert_eq!(ws.schema().await["properties"]["empty"]["items"], json!({}));
}

#[tokio::test]
async fn add_fragment_replaces_items_on_an_array_target() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "properties": {"list": {"type": "array", "items": {}}}
        }),
        "seed",
    )
    .await;

    ws.add_fragment(&json!(true), "ignored", Some(&path(&["properties", "list"])))
        .await;
    assert_eq!(
        ws.schema().await["properties"]["list"]["items"],
        json!({"type": "boolean", "description": "Boolean flag"})
    );
}

#[tokio::test]
async fn add_fragment_rejects_a_primitive_target() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "properties": {"name": {"type": "string", "description": "Text field"}}
        }),
        "seed",
    )
    .await;
    let before = ws.schema().await;
    let history_before = ws.history().await.len();

    ws.add_fragment(&json!(1), "child", Some(&path(&["properties", "name"])))
        .await;

    assert_eq!(ws.schema().await, before);
    assert_eq!(ws.history().await.len(), history_before);
}

#[tokio::test]
async fn add_fragment_falls_back_to_root_when_path_is_unresolvable() {
    let ws = service();
    ws.add_fragment(&json!("x"), "label", Some(&path(&["properties", "missing"])))
        .await;
    assert_eq!(
        ws.schema().await["properties"]["label"],
        json!({"type": "string", "description": "Text field"})
    );
}

#[tokio::test]
async fn add_node_builds_typed_stubs_with_placeholder_descriptions() {
    let ws = service();
    ws.add_node("object", "address").await;
    ws.add_node("string", "city").await;

    let schema = ws.schema().await;
    assert_eq!(
        schema["properties"]["address"],
        json!({"type": "object", "description": "Description for address", "properties": {}})
    );
    assert_eq!(
        schema["properties"]["city"],
        json!({"type": "string", "description": "Description for city"})
    );
}

#[tokio::test]
async fn delete_then_re_add_yields_a_fresh_stub_not_the_old_subtree() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "description": "Customer address",
                    "properties": {"city": {"type": "string", "description": "City"}}
                }
            }
        }),
        "seed",
    )
    .await;

    ws.delete_node(&path(&["properties", "address"])).await;
    assert!(ws.schema().await["properties"].get("address").is_none());

    ws.add_node("object", "address").await;
    let restored = &ws.schema().await["properties"]["address"];
    assert_eq!(restored["description"], "Description for address");
    assert_eq!(restored["properties"], json!({}));
}

#[tokio::test]
async fn rename_preserves_property_order() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "number", "description": "kept"},
                "c": {"type": "boolean"}
            }
        }),
        "seed",
    )
    .await;

    ws.rename_node(&path(&["properties", "b"]), "middle").await;

    let schema = ws.schema().await;
    let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["a", "middle", "c"]);
    assert_eq!(schema["properties"]["middle"]["description"], "kept");
}

#[tokio::test]
async fn rename_is_a_noop_for_missing_keys_and_empty_paths() {
    let ws = service();
    let before = ws.schema().await;
    ws.rename_node(&path(&["properties", "ghost"]), "spirit").await;
    ws.rename_node(&[], "root").await;
    assert_eq!(ws.schema().await, before);
}

#[tokio::test]
async fn delete_splices_array_parents_by_index() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "oneOf": [
                {"type": "string"},
                {"type": "number"},
                {"type": "boolean"}
            ]
        }),
        "seed",
    )
    .await;

    ws.delete_node(&path(&["oneOf", "1"])).await;
    assert_eq!(
        ws.schema().await["oneOf"],
        json!([{"type": "string"}, {"type": "boolean"}])
    );
}

#[tokio::test]
async fn move_into_own_descendant_is_rejected() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {"b": {"type": "object", "properties": {}}}
                }
            }
        }),
        "seed",
    )
    .await;
    let before = ws.schema().await;

    ws.move_node(
        &path(&["properties", "a"]),
        &path(&["properties", "a", "properties", "b"]),
    )
    .await;

    assert_eq!(ws.schema().await, before);
}

#[tokio::test]
async fn move_relocates_a_node_under_the_target_properties() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "to move"},
                "nested": {"type": "object", "properties": {}}
            }
        }),
        "seed",
    )
    .await;

    ws.move_node(&path(&["properties", "name"]), &path(&["properties", "nested"]))
        .await;

    let schema = ws.schema().await;
    assert!(schema["properties"].get("name").is_none());
    assert_eq!(
        schema["properties"]["nested"]["properties"]["name"]["description"],
        "to move"
    );
}

#[tokio::test]
async fn move_to_a_non_object_target_commits_nothing() {
    let ws = service();
    ws.update_schema(
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "number"}
            }
        }),
        "seed",
    )
    .await;
    let before = ws.schema().await;
    let history_before = ws.history().await.len();

    ws.move_node(&path(&["properties", "name"]), &path(&["properties", "age"]))
        .await;

    // The draft-side delete must not leak: nothing committed at all.
    assert_eq!(ws.schema().await, before);
    assert_eq!(ws.history().await.len(), history_before);
}
