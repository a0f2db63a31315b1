use super::*;
use crate::core::workspace::MAX_HISTORY;

#[tokio::test]
async fn every_commit_snapshots_the_previous_document() {
    let ws = service();
    let original = ws.schema().await;

    ws.update_schema(json!({"type": "object", "properties": {"a": {}}}), "step one")
        .await;

    let history = ws.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].schema, original);
    assert_eq!(history[0].action, "step one");
}

#[tokio::test]
async fn history_is_capped_at_twenty_five_entries() {
    let ws = service();
    for i in 0..30 {
        ws.update_schema(
            json!({"type": "object", "properties": {}, "title": format!("v{i}")}),
            &format!("mutation {i}"),
        )
        .await;
    }

    let history = ws.history().await;
    assert_eq!(history.len(), MAX_HISTORY);
    // Front-newest: the most recent previous-state is v28.
    assert_eq!(history[0].schema["title"], "v28");
    assert_eq!(history[0].action, "mutation 29");
}

#[tokio::test]
async fn restore_is_an_append_only_commit_not_a_rewind() {
    let ws = service();
    let s1 = json!({"type": "object", "properties": {}, "title": "one"});
    let s2 = json!({"type": "object", "properties": {}, "title": "two"});
    ws.update_schema(s1.clone(), "commit one").await;
    ws.update_schema(s2.clone(), "commit two").await;
    // Current: s2; history front holds s1.

    let v_s1 = ws.history().await[0].clone();
    assert_eq!(v_s1.schema, s1);
    ws.restore_version(&v_s1.id).await;
    assert_eq!(ws.schema().await, s1);

    // The restore pushed s2 as a new version; restoring that yields the
    // state two commits prior, bit for bit.
    let v_s2 = ws.history().await[0].clone();
    assert_eq!(v_s2.schema, s2);
    ws.restore_version(&v_s2.id).await;
    assert_eq!(ws.schema().await, s2);

    // History only ever grew.
    assert_eq!(ws.history().await.len(), 4);
}

#[tokio::test]
async fn restore_with_an_unknown_id_is_a_noop() {
    let ws = service();
    ws.update_schema(json!({"type": "object", "properties": {}}), "seed")
        .await;
    let before = ws.schema().await;
    ws.restore_version("no-such-version").await;
    assert_eq!(ws.schema().await, before);
    assert_eq!(ws.history().await.len(), 1);
}

#[tokio::test]
async fn commits_clear_mapped_content_on_every_file() {
    let ws = service();
    let top = ws.add_file("top.json", json!({"a": 1})).await;
    ws.add_files(vec![
        ("one.json".into(), json!({"b": 2})),
        ("two.json".into(), json!({"c": 3})),
    ])
    .await;
    let nested = ws.all_files_flat().await[2].id.clone();

    ws.set_mapping(&top, json!({"mapped": true})).await;
    ws.set_mapping(&nested, json!({"mapped": true})).await;
    assert!(ws.selected_file().await.is_none());

    ws.update_schema(json!({"type": "object", "properties": {}}), "invalidate")
        .await;

    for file in ws.all_files_flat().await {
        assert!(file.mapped_content.is_none(), "{} kept stale mapping", file.name);
    }
}

#[tokio::test]
async fn improvement_cache_is_keyed_by_content_not_name() {
    use crate::core::workspace::{ImprovementCategory, SchemaImprovement};

    let ws = service();
    ws.set_cached_improvements(vec![SchemaImprovement {
        id: "imp-1".into(),
        title: "Add descriptions".into(),
        description: "Document every field".into(),
        category: ImprovementCategory::Documentation,
    }])
    .await;
    assert!(ws.cached_improvements().await.is_some());

    // Renaming the schema does not touch the content fingerprint.
    ws.set_schema_name("RenamedSchema").await;
    assert!(ws.cached_improvements().await.is_some());

    // Any content change misses the cache.
    ws.add_node("string", "extra").await;
    assert!(ws.cached_improvements().await.is_none());
}
