use super::*;
use crate::core::workspace::{aggregate_content, is_json_schema};

#[tokio::test]
async fn a_single_file_is_added_directly_and_a_batch_becomes_a_group() {
    let ws = service();
    ws.add_files(vec![("alone.json".into(), json!({"a": 1}))]).await;
    let files = ws.files().await;
    assert_eq!(files.len(), 1);
    assert!(!files[0].is_group());

    ws.add_files(vec![
        ("one.json".into(), json!({"b": 2})),
        ("two.json".into(), json!({"c": 3})),
    ])
    .await;
    let files = ws.files().await;
    assert_eq!(files.len(), 2);
    assert!(files[1].is_group());
    assert_eq!(files[1].name, "Group 1");
    assert_eq!(files[1].children.as_ref().unwrap().len(), 2);
}

#[tokio::test]
async fn group_names_count_past_the_highest_existing_number() {
    let ws = service();
    ws.add_file("Group 7", Value::Null).await;
    ws.add_files(vec![
        ("a.json".into(), json!(1)),
        ("b.json".into(), json!(2)),
    ])
    .await;
    assert_eq!(ws.files().await[1].name, "Group 8");
}

#[tokio::test]
async fn grouping_two_leaves_wraps_them_in_place() {
    let ws = service();
    let target = ws.add_file("target.json", json!({"t": 1})).await;
    let source = ws.add_file("source.json", json!({"s": 2})).await;
    ws.add_file("bystander.json", json!({})).await;

    ws.group_files(&target, &source).await;

    let files = ws.files().await;
    assert_eq!(files.len(), 2);
    // The group took the target's slot.
    assert!(files[0].is_group());
    let names: Vec<&str> = files[0]
        .children
        .as_ref()
        .unwrap()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, ["target.json", "source.json"]);
    assert_eq!(files[1].name, "bystander.json");
}

#[tokio::test]
async fn grouping_into_an_existing_group_appends() {
    let ws = service();
    ws.add_files(vec![
        ("a.json".into(), json!(1)),
        ("b.json".into(), json!(2)),
    ])
    .await;
    let group = ws.files().await[0].id.clone();
    let extra = ws.add_file("c.json", json!(3)).await;

    ws.group_files(&group, &extra).await;

    let files = ws.files().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].children.as_ref().unwrap().len(), 3);
}

#[tokio::test]
async fn aggregate_content_collects_samples_recursively() {
    let ws = service();
    ws.add_files(vec![
        ("a.json".into(), json!({"a": 1})),
        ("b.json".into(), json!({"b": 2})),
    ])
    .await;
    let group = ws.files().await[0].clone();

    let samples = aggregate_content(&group);
    assert_eq!(samples, json!([{"a": 1}, {"b": 2}]));

    let leaf = &group.children.as_ref().unwrap()[0];
    assert_eq!(aggregate_content(leaf), json!({"a": 1}));
}

#[tokio::test]
async fn selected_file_is_found_recursively() {
    let ws = service();
    ws.add_files(vec![
        ("a.json".into(), json!(1)),
        ("b.json".into(), json!(2)),
    ])
    .await;
    let nested = ws.files().await[0].children.as_ref().unwrap()[1].id.clone();

    ws.select_file(Some(&nested)).await;
    assert_eq!(ws.selected_file().await.unwrap().name, "b.json");

    ws.select_file(Some("")).await;
    assert!(ws.selected_file().await.is_none());
}

#[test]
fn schema_detection_heuristics() {
    assert!(is_json_schema(&json!({"$schema": "x"})));
    assert!(is_json_schema(&json!({"type": "object", "properties": {}})));
    assert!(is_json_schema(&json!({"definitions": {}, "type": "object"})));
    assert!(is_json_schema(&json!({"title": "T", "type": "object"})));
    assert!(!is_json_schema(&json!({"name": "plain data"})));
    assert!(!is_json_schema(&json!([1, 2, 3])));
    assert!(!is_json_schema(&json!("string")));
}

#[tokio::test]
async fn load_schema_strips_the_json_extension_from_the_name() {
    let ws = service();
    ws.load_schema(json!({"type": "object", "properties": {}}), "Invoice.json")
        .await;
    assert_eq!(ws.schema_name().await, "Invoice");
    assert_eq!(ws.history().await[0].action, "Loaded schema: Invoice.json");
}
