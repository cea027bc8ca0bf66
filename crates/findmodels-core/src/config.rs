//! Centralized configuration for the model finder.
//!
//! Constants live on unit structs grouped by concern; [`FinderConfig`] is the
//! runtime-overridable subset that consumers may load from a file.

use crate::models::ModelCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const USER_AGENT: &'static str = "findmodels/0.1";
}

/// Search-result cache configuration.
pub struct CacheConfig;

impl CacheConfig {
    /// Namespace tag prefixed to every cache key.
    pub const KEY_PREFIX: &'static str = "comfyui-find-models-cache-";
    /// Entries older than this are treated as misses.
    pub const TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    /// Maximum number of keys examined by one sweep batch.
    pub const SWEEP_BATCH_SIZE: usize = 100;
    /// Pause between sweep batches when more keys remain.
    pub const SWEEP_RESCHEDULE_DELAY: Duration = Duration::from_millis(100);
    pub const DB_FILE_NAME: &'static str = "find-models-cache.sqlite";
}

/// Batched search configuration.
pub struct SearchConfig;

impl SearchConfig {
    pub const DEFAULT_CONCURRENCY: usize = 3;
    pub const CHUNK_DELAY: Duration = Duration::from_millis(200);
}

/// Host (graph editor server) endpoints.
pub struct HostConfig;

impl HostConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8188";
    pub const OBJECT_INFO_PATH: &'static str = "/object_info";
    pub const EXTRA_MODEL_PATHS_PATH: &'static str =
        "/comfyui-find-models/api/v1/system/extra-model-paths";
    pub const SEARCH_PATH: &'static str = "/comfyui-find-models/api/v1/models/search";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    /// Remote searches fan out to several catalogs server-side.
    pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(60);
}

/// Display-time thresholds.
pub struct DisplayConfig;

impl DisplayConfig {
    pub const MIN_DISPLAY_FILE_SIZE: f64 = 10.0 * 1024.0 * 1024.0;
    pub const UNKNOWN_FAMILY: &'static str = "Unknown";
}

/// Catalogs the remote backend should consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFlags {
    pub civitai: bool,
    pub huggingface: bool,
    pub google: bool,
}

impl Default for SearchFlags {
    fn default() -> Self {
        Self {
            civitai: true,
            huggingface: true,
            google: false,
        }
    }
}

/// Runtime configuration for a [`crate::ModelFinder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Base URL of the host server.
    pub host_url: String,
    /// Number of searches issued together per chunk.
    pub concurrency: usize,
    /// Delay between chunks in milliseconds.
    pub chunk_delay_ms: u64,
    /// Catalog selection forwarded to the search backend.
    pub search_flags: SearchFlags,
    /// Per-request timeout for host metadata calls.
    pub request_timeout_secs: u64,
    /// Per-request timeout for remote link searches.
    pub search_timeout_secs: u64,
}

impl FinderConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    /// Host metadata timeout; values below one second are raised to one.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Link search timeout; values below one second are raised to one.
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs.max(1))
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            host_url: HostConfig::DEFAULT_BASE_URL.to_string(),
            concurrency: SearchConfig::DEFAULT_CONCURRENCY,
            chunk_delay_ms: SearchConfig::CHUNK_DELAY.as_millis() as u64,
            search_flags: SearchFlags::default(),
            request_timeout_secs: HostConfig::REQUEST_TIMEOUT.as_secs(),
            search_timeout_secs: HostConfig::SEARCH_TIMEOUT.as_secs(),
        }
    }
}

/// Default install directory per category, relative to the models root.
///
/// `Other` has no entry of its own; lookups for it (or any removed entry)
/// fall back to [`DirectoryTable::FALLBACK_DIR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryTable(BTreeMap<ModelCategory, String>);

impl DirectoryTable {
    pub const FALLBACK_DIR: &'static str = "checkpoints";

    pub fn get(&self, category: ModelCategory) -> Option<&str> {
        self.0.get(&category).map(String::as_str)
    }

    /// Override the directory for one category.
    pub fn with_dir(mut self, category: ModelCategory, dir: impl Into<String>) -> Self {
        self.0.insert(category, dir.into());
        self
    }

    pub fn without(mut self, category: ModelCategory) -> Self {
        self.0.remove(&category);
        self
    }
}

impl Default for DirectoryTable {
    fn default() -> Self {
        Self(
            ModelCategory::ALL
                .iter()
                .filter_map(|category| Some((*category, category.directory_key()?.to_string())))
                .collect(),
        )
    }
}
