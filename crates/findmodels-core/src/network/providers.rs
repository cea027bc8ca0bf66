//! Host collaborator seams consumed by the engine.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Source of the host's node capability document (`object_info`).
#[async_trait]
pub trait InstalledAssetsProvider: Send + Sync {
    async fn object_info(&self) -> Result<Value>;
}

/// Source of the host's external model path table.
///
/// `Ok(None)` means the host has no external paths configured.
#[async_trait]
pub trait PathConfigProvider: Send + Sync {
    async fn path_config(&self) -> Result<Option<Value>>;
}
