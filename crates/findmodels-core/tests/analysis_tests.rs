//! Integration tests for analysis through the ModelFinder public interface.

mod common;

use common::{build_finder, build_finder_with_store, checkpoint_metadata, loader_node, FakeHost};
use findmodels_core::{
    AnalysisEvent, GraphDocument, KeyValueStore, LinkResult, LinkSource, ModelCategory,
    SearchUpdate, SqliteStore,
};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn lora_graph(count: i64) -> GraphDocument {
    GraphDocument::new(
        (1..=count)
            .map(|i| loader_node(i, "LoraLoader", &format!("lora_{i}.safetensors"), 0))
            .collect(),
    )
}

async fn collect_events(
    finder: &findmodels_core::ModelFinder,
    graph: &GraphDocument,
) -> Vec<AnalysisEvent> {
    let mut events = Vec::new();
    finder
        .analyze_with(graph, |event| events.push(event))
        .await
        .unwrap();
    events
}

#[tokio::test]
async fn test_empty_graph_is_no_workflow() {
    let host = Arc::new(FakeHost::default());
    let finder = build_finder(host.clone());

    let events = collect_events(&finder, &GraphDocument::default()).await;
    assert_eq!(events, vec![AnalysisEvent::NoWorkflow]);
    assert_eq!(host.calls(), 0);

    let from_json = GraphDocument::from_json_str(r#"{"nodes": null}"#).unwrap();
    let session = finder.analyze_with(&from_json, |_| {}).await.unwrap();
    assert!(session.is_none());
    assert_eq!(host.calls(), 0);
}

#[tokio::test]
async fn test_installed_checkpoint_needs_no_search() {
    let host = Arc::new(FakeHost {
        object_info: checkpoint_metadata(&["sdxl_base.safetensors"]),
        ..Default::default()
    });
    let finder = build_finder(host.clone());
    let graph = GraphDocument::new(vec![loader_node(
        1,
        "CheckpointLoaderSimple",
        "SDXL_base.safetensors",
        0,
    )]);

    let events = collect_events(&finder, &graph).await;
    assert_eq!(events.len(), 2);
    let AnalysisEvent::Final(snapshot) = &events[1] else {
        panic!("expected final snapshot, got {:?}", events[1]);
    };

    let record = &snapshot.models["Main Model:SDXL_base.safetensors"];
    assert!(record.installed);
    assert!(record.used);
    assert_eq!(record.matched_installed_name.as_deref(), Some("sdxl_base.safetensors"));
    assert_eq!(record.local_path.as_deref(), Some("checkpoints/sdxl_base.safetensors"));
    assert_eq!(snapshot.stats().installed, 1);
    assert_eq!(host.search_calls(), 0);
}

#[tokio::test]
async fn test_disabled_loader_is_recorded_unused() {
    let host = Arc::new(FakeHost::default());
    let finder = build_finder(host);
    let graph = GraphDocument::new(vec![loader_node(
        7,
        "CheckpointLoaderSimple",
        "sdxl_base.safetensors",
        2,
    )]);

    let session = finder.analyze_with(&graph, |_| {}).await.unwrap().unwrap();
    let record = &session.snapshot().models["Main Model:sdxl_base.safetensors"];
    assert_eq!(record.category, ModelCategory::MainModel);
    assert!(!record.used);
    assert!(!record.installed);
    assert_eq!(record.source_node_ids, vec![7]);
}

#[tokio::test(start_paused = true)]
async fn test_seven_missing_models_search_in_three_chunks() {
    let host = Arc::new(FakeHost::default());
    let finder = build_finder(host.clone());

    let events = collect_events(&finder, &lora_graph(7)).await;

    let AnalysisEvent::Initial(initial) = &events[0] else {
        panic!("expected initial snapshot");
    };
    assert_eq!(initial.missing_count, 7);
    assert_eq!(initial.models_to_search.len(), 7);
    assert!(initial.model_links.is_empty());
    assert!(initial.is_pending("LoRA:lora_1.safetensors"));

    // L = loading, R = resolved
    let shape: String = events
        .iter()
        .filter_map(|event| match event {
            AnalysisEvent::Update(SearchUpdate::Loading { .. }) => Some('L'),
            AnalysisEvent::Update(SearchUpdate::Resolved { .. }) => Some('R'),
            _ => None,
        })
        .collect();
    assert_eq!(shape, "LLLRRRLLLRRRLR");
    assert_eq!(host.search_calls(), 7);

    let AnalysisEvent::Final(last) = events.last().unwrap() else {
        panic!("expected final snapshot");
    };
    assert_eq!(last.model_links.len(), 7);
    assert!(!last.is_pending("LoRA:lora_1.safetensors"));
}

#[tokio::test(start_paused = true)]
async fn test_cache_hits_skip_the_search() {
    let host = Arc::new(FakeHost::default());
    let finder = build_finder(host.clone());
    finder.cache().set("lora_2.safetensors", &[]);
    finder.cache().set(
        "LORA_5.safetensors",
        &[LinkResult::new(LinkSource::Civitai, "https://civitai.com/models/5")],
    );

    let session = finder
        .analyze_with(&lora_graph(7), |_| {})
        .await
        .unwrap()
        .unwrap();

    assert_eq!(host.search_calls(), 5);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.models_to_search.len(), 5);
    assert!(snapshot.links("LoRA:lora_2.safetensors").is_empty());
    assert_eq!(snapshot.links("LoRA:lora_5.safetensors")[0].source, LinkSource::Civitai);
}

#[tokio::test(start_paused = true)]
async fn test_failures_degrade() {
    let host = Arc::new(FakeHost {
        fail_assets: true,
        failing_searches: vec!["lora_1.safetensors".into()],
        ..Default::default()
    });
    let finder = build_finder(host.clone());

    let session = finder
        .analyze_with(&lora_graph(2), |_| {})
        .await
        .unwrap()
        .unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.missing_count, 2);
    assert!(snapshot.links("LoRA:lora_1.safetensors").is_empty());
    assert_eq!(snapshot.links("LoRA:lora_2.safetensors").len(), 1);

    // the failed search is retried on the next pass, the successful one is cached
    finder.analyze_with(&lora_graph(2), |_| {}).await.unwrap();
    assert_eq!(host.search_calls(), 3);
}

#[tokio::test]
async fn test_external_path_keeps_last_directory() {
    let host = Arc::new(FakeHost {
        object_info: checkpoint_metadata(&["sdxl_base.safetensors"]),
        path_config: Some(json!({"checkpoints": {"defaultPath": "a/b/c"}})),
        ..Default::default()
    });
    let finder = build_finder(host);
    let graph = GraphDocument::new(vec![loader_node(
        1,
        "CheckpointLoaderSimple",
        "sdxl_base.safetensors",
        0,
    )]);

    let session = finder.analyze_with(&graph, |_| {}).await.unwrap().unwrap();
    let record = &session.snapshot().models["Main Model:sdxl_base.safetensors"];
    assert_eq!(record.local_path.as_deref(), Some("c/sdxl_base.safetensors"));
}

#[tokio::test(start_paused = true)]
async fn test_analyze_stream_ends_after_final() {
    let host = Arc::new(FakeHost::default());
    let finder = Arc::new(build_finder(host));

    let events: Vec<_> = finder.analyze(lora_graph(4)).collect().await;
    assert!(matches!(events.first(), Some(AnalysisEvent::Initial(_))));
    assert!(matches!(events.last(), Some(AnalysisEvent::Final(_))));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(events.len(), 2 + 4 * 2);
}

#[tokio::test]
async fn test_analyze_stream_no_workflow() {
    let finder = Arc::new(build_finder(Arc::new(FakeHost::default())));
    let events: Vec<_> = finder.analyze(GraphDocument::default()).collect().await;
    assert_eq!(events, vec![AnalysisEvent::NoWorkflow]);
}

#[tokio::test]
async fn test_expired_sqlite_entry_is_searched_again() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::new(temp_dir.path().join("test_cache.sqlite")).unwrap());
    let eight_days_ago = chrono::Utc::now().timestamp_millis() - 8 * 24 * 60 * 60 * 1000;
    store
        .set(
            &findmodels_core::cache::cache_key("lora_1.safetensors"),
            &json!({"timestamp": eight_days_ago, "results": []}).to_string(),
        )
        .unwrap();

    let host = Arc::new(FakeHost::default());
    let finder = build_finder_with_store(host.clone(), store);
    assert!(finder.cache().get("lora_1.safetensors").is_none());

    finder.analyze_with(&lora_graph(1), |_| {}).await.unwrap();
    assert_eq!(host.search_calls(), 1);
    assert!(finder.cache().get("lora_1.safetensors").is_some());
}
