//! Single-model refresh on ModelFinder.

use super::state::{AnalysisSession, RefreshedModel};
use crate::error::Result;
use crate::graph::extract;
use crate::models::ModelCategory;
use crate::reconcile::reconcile_one;
use crate::ModelFinder;
use std::collections::HashMap;
use tracing::info;

impl ModelFinder {
    /// Re-resolve one model, ignoring any cached links.
    ///
    /// Usage and source nodes come from the session's graph when there is
    /// one; without it the model is treated as used by no known node.
    pub async fn refresh_one(
        &self,
        session: Option<&AnalysisSession>,
        name: &str,
        category: ModelCategory,
    ) -> Result<RefreshedModel> {
        self.orchestrator.cache().invalidate(name);

        let (inventory, path_config) = self.host_state().await;
        let (usage, nodes) = match session {
            Some(session) => {
                let extraction = extract(session.graph());
                (extraction.usage, extraction.nodes)
            }
            None => (HashMap::new(), HashMap::new()),
        };

        let record = reconcile_one(
            category,
            name,
            &inventory,
            &usage,
            &nodes,
            &self.directories,
            path_config.as_ref(),
        );
        let links = self.orchestrator.search_one(name, category, true).await;

        info!(
            model = name,
            installed = record.installed,
            links = links.len(),
            "Refreshed model"
        );
        Ok(RefreshedModel { record, links })
    }
}
