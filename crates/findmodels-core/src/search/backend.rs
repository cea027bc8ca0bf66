//! Remote link-search seam.

use crate::config::SearchFlags;
use crate::error::Result;
use crate::models::{LinkResult, ModelCategory};
use async_trait::async_trait;

/// One remote lookup for a model's download sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub model_name: String,
    pub model_type: ModelCategory,
    pub flags: SearchFlags,
}

impl SearchRequest {
    pub fn new(
        model_name: impl Into<String>,
        model_type: ModelCategory,
        flags: SearchFlags,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            model_type,
            flags,
        }
    }
}

/// A service that finds download links for a model name.
///
/// Implementations report transport and status failures as errors; the
/// orchestrator turns those into empty results.
#[async_trait]
pub trait LinkSearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<LinkResult>>;
}
