//! Shared fakes for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use findmodels_core::{
    FinderConfig, FinderError, InstalledAssetsProvider, KeyValueStore, LinkResult,
    LinkSearchBackend, LinkSource, MemoryStore, ModelFinder, PathConfigProvider, Result,
    SearchRequest,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-process stand-in for the host: metadata, path table and search.
#[derive(Default)]
pub struct FakeHost {
    pub object_info: Value,
    pub path_config: Option<Value>,
    pub fail_assets: bool,
    pub failing_searches: Vec<String>,
    pub asset_calls: AtomicUsize,
    pub path_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub searched: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn calls(&self) -> usize {
        self.asset_calls.load(Ordering::SeqCst)
            + self.path_calls.load(Ordering::SeqCst)
            + self.search_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstalledAssetsProvider for FakeHost {
    async fn object_info(&self) -> Result<Value> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_assets {
            return Err(FinderError::Network {
                message: "connection refused".into(),
                cause: None,
            });
        }
        Ok(self.object_info.clone())
    }
}

#[async_trait]
impl PathConfigProvider for FakeHost {
    async fn path_config(&self) -> Result<Option<Value>> {
        self.path_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.path_config.clone())
    }
}

#[async_trait]
impl LinkSearchBackend for FakeHost {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<LinkResult>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.searched.lock().unwrap().push(request.model_name.clone());
        if self.failing_searches.contains(&request.model_name) {
            return Err(FinderError::HttpStatus {
                url: "http://host/search".into(),
                status: 502,
            });
        }
        Ok(vec![LinkResult::new(
            LinkSource::HuggingFace,
            format!("https://huggingface.co/models/{}", request.model_name),
        )
        .with_file_size(64.0 * 1024.0 * 1024.0)])
    }
}

pub fn build_finder(host: Arc<FakeHost>) -> ModelFinder {
    build_finder_with_store(host, Arc::new(MemoryStore::new()))
}

pub fn build_finder_with_store(host: Arc<FakeHost>, store: Arc<dyn KeyValueStore>) -> ModelFinder {
    ModelFinder::builder()
        .with_config(FinderConfig::default())
        .with_store(store)
        .with_assets_provider(host.clone())
        .with_path_config_provider(host.clone())
        .with_search_backend(host)
        .build()
        .unwrap()
}

pub fn loader_node(id: i64, node_type: &str, value: &str, mode: i64) -> Value {
    json!({
        "id": id,
        "type": node_type,
        "mode": mode,
        "widgets_values": [value],
        "inputs": [],
        "outputs": [{"links": [id * 10]}]
    })
}

pub fn checkpoint_metadata(names: &[&str]) -> Value {
    json!({
        "CheckpointLoaderSimple": {
            "input": {"required": {"ckpt_name": [names, {}]}}
        }
    })
}
