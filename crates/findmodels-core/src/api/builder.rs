//! Builder for configuring ModelFinder initialization.

use std::sync::Arc;

use crate::cache::{KeyValueStore, MemoryStore, SearchCache};
use crate::config::{DirectoryTable, FinderConfig};
use crate::error::{FinderError, Result};
use crate::network::{ComfyHost, HttpClient, InstalledAssetsProvider, PathConfigProvider};
use crate::search::{LinkSearchBackend, SearchOrchestrator};
use crate::ModelFinder;
use tracing::debug;

/// Builder for configuring ModelFinder initialization.
///
/// Collaborators that are not set explicitly are served by a [`ComfyHost`]
/// at [`FinderConfig::host_url`]. Without a store, search results are cached
/// in memory for the lifetime of the finder.
///
/// # Example
///
/// ```rust,ignore
/// use findmodels_core::ModelFinder;
///
/// let finder = ModelFinder::builder()
///     .with_store(Arc::new(SqliteStore::new("cache.sqlite")?))
///     .with_search_backend(Arc::new(MyBackend))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ModelFinderBuilder {
    config: FinderConfig,
    directories: DirectoryTable,
    store: Option<Arc<dyn KeyValueStore>>,
    assets: Option<Arc<dyn InstalledAssetsProvider>>,
    path_configs: Option<Arc<dyn PathConfigProvider>>,
    search: Option<Arc<dyn LinkSearchBackend>>,
}

impl ModelFinderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: FinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the default category directory table.
    pub fn with_directory_table(mut self, directories: DirectoryTable) -> Self {
        self.directories = directories;
        self
    }

    /// Storage backing the search cache.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_assets_provider(mut self, provider: Arc<dyn InstalledAssetsProvider>) -> Self {
        self.assets = Some(provider);
        self
    }

    pub fn with_path_config_provider(mut self, provider: Arc<dyn PathConfigProvider>) -> Self {
        self.path_configs = Some(provider);
        self
    }

    pub fn with_search_backend(mut self, backend: Arc<dyn LinkSearchBackend>) -> Self {
        self.search = Some(backend);
        self
    }

    /// Use one host for every collaborator.
    pub fn with_host(self, host: ComfyHost) -> Self {
        let host = Arc::new(host);
        self.with_assets_provider(host.clone())
            .with_path_config_provider(host.clone())
            .with_search_backend(host)
    }

    fn default_host(config: &FinderConfig) -> Result<Arc<ComfyHost>> {
        url::Url::parse(&config.host_url).map_err(|e| FinderError::Config {
            message: format!("Invalid host URL '{}': {}", config.host_url, e),
        })?;
        let client = HttpClient::with_timeout(config.request_timeout())?;
        debug!(host = %config.host_url, "Using HTTP host collaborators");
        Ok(Arc::new(
            ComfyHost::with_client(config.host_url.clone(), client)
                .with_search_timeout(config.search_timeout()),
        ))
    }

    /// Build the ModelFinder instance.
    pub fn build(self) -> Result<ModelFinder> {
        let config = &self.config;
        let mut host: Option<Arc<ComfyHost>> = None;
        let mut shared_host = || -> Result<Arc<ComfyHost>> {
            if let Some(host) = &host {
                return Ok(host.clone());
            }
            let created = Self::default_host(config)?;
            host = Some(created.clone());
            Ok(created)
        };

        let assets: Arc<dyn InstalledAssetsProvider> = match self.assets {
            Some(provider) => provider,
            None => shared_host()?,
        };
        let path_configs: Arc<dyn PathConfigProvider> = match self.path_configs {
            Some(provider) => provider,
            None => shared_host()?,
        };
        let search: Arc<dyn LinkSearchBackend> = match self.search {
            Some(backend) => backend,
            None => shared_host()?,
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);
        let orchestrator = SearchOrchestrator::new(search, SearchCache::new(store))
            .with_flags(self.config.search_flags)
            .with_chunk_delay(self.config.chunk_delay());

        Ok(ModelFinder {
            assets,
            path_configs,
            orchestrator,
            directories: self.directories,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build_uses_http_host() {
        let finder = ModelFinderBuilder::new().build().unwrap();
        assert_eq!(finder.config().concurrency, 3);
        assert_eq!(finder.directories().get(crate::ModelCategory::Vae), Some("vae"));
    }

    #[test]
    fn test_invalid_host_url_is_rejected() {
        let config = FinderConfig {
            host_url: "not a url".into(),
            ..FinderConfig::default()
        };
        let err = ModelFinderBuilder::new().with_config(config).build().err().unwrap();
        assert!(matches!(err, FinderError::Config { .. }));
    }
}
