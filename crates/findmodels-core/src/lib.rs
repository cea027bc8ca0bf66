//! Find Models Core - Headless engine for finding a workflow's missing models.
//!
//! Given a node-graph document from a ComfyUI-style host, the engine works
//! out which model files the graph references, checks them against what the
//! host reports as installed, and searches remote catalogs for download links
//! to the rest. Search results are cached for a week.
//!
//! # Example
//!
//! ```rust,ignore
//! use findmodels_core::{AnalysisEvent, ComfyHost, GraphDocument, ModelFinder};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> findmodels_core::Result<()> {
//!     let finder = Arc::new(
//!         ModelFinder::builder()
//!             .with_host(ComfyHost::new("http://127.0.0.1:8188")?)
//!             .build()?,
//!     );
//!
//!     let graph = GraphDocument::from_json_str(&std::fs::read_to_string("workflow.json")?)?;
//!     let mut events = Box::pin(finder.analyze(graph));
//!     while let Some(event) = events.next().await {
//!         if let AnalysisEvent::Final(snapshot) = event {
//!             println!("{} missing", snapshot.missing_count);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod classification;
pub mod config;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod models;
pub mod network;
pub mod paths;
pub mod presentation;
pub mod reconcile;
pub mod search;

mod api;

// Re-export commonly used types
pub use api::{
    AnalysisEvent, AnalysisSession, AnalysisSnapshot, AnalysisStats, ModelFinderBuilder,
    RefreshedModel,
};
pub use cache::{KeyValueStore, MemoryStore, SearchCache, SqliteStore};
pub use config::{DirectoryTable, FinderConfig, SearchFlags};
pub use error::{FinderError, Result};
pub use graph::{extract, Extraction, GraphDocument, RequiredModels};
pub use inventory::{classify, InstalledInventory};
pub use models::{LinkResult, LinkSource, ModelCategory, ModelRequirement, ModelStatusRecord};
pub use network::{ComfyHost, HttpClient, InstalledAssetsProvider, PathConfigProvider};
pub use reconcile::{reconcile, reconcile_one, Reconciliation};
pub use search::{LinkSearchBackend, SearchOrchestrator, SearchRequest, SearchUpdate};

use std::sync::Arc;

/// Main entry point for model analysis.
///
/// Holds the host collaborators, the search cache and the runtime
/// configuration. The analysis and refresh methods live in the `api`
/// submodules.
pub struct ModelFinder {
    assets: Arc<dyn InstalledAssetsProvider>,
    path_configs: Arc<dyn PathConfigProvider>,
    orchestrator: SearchOrchestrator,
    directories: DirectoryTable,
    config: FinderConfig,
}

impl ModelFinder {
    /// Create a builder for ModelFinder.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let finder = ModelFinder::builder()
    ///     .with_config(config)
    ///     .with_store(Arc::new(SqliteStore::new(path)?))
    ///     .build()?;
    /// ```
    pub fn builder() -> ModelFinderBuilder {
        ModelFinderBuilder::new()
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn directories(&self) -> &DirectoryTable {
        &self.directories
    }

    pub fn cache(&self) -> &SearchCache {
        self.orchestrator.cache()
    }
}
