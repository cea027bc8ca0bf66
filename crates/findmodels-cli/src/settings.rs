//! Runtime configuration for the CLI: file, then flags.

use anyhow::{Context, Result};
use findmodels_core::config::CacheConfig;
use findmodels_core::FinderConfig;
use std::path::{Path, PathBuf};

/// Flag overrides applied on top of the configuration file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub concurrency: Option<usize>,
    pub google: bool,
}

/// Load a `FinderConfig` from a JSON file, or defaults when no file is given.
/// Missing fields take their default values.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<FinderConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => FinderConfig::default(),
    };

    if let Some(host) = &overrides.host {
        config.host_url = host.clone();
    }
    if let Some(concurrency) = overrides.concurrency {
        config.concurrency = concurrency;
    }
    if overrides.google {
        config.search_flags.google = true;
    }
    Ok(config)
}

/// Location of the persistent search cache.
pub fn cache_db_path(cache_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match cache_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::cache_dir()
            .context("No user cache directory on this platform; pass --cache-dir")?
            .join("findmodels"),
    };
    Ok(dir.join(CacheConfig::DB_FILE_NAME))
}
