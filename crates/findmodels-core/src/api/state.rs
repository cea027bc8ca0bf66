//! Analysis results handed to consumers.

use crate::graph::GraphDocument;
use crate::inventory::InstalledInventory;
use crate::models::{LinkResult, ModelCategory, ModelStatusRecord};
use crate::presentation;
use crate::reconcile::Reconciliation;
use crate::search::SearchUpdate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Summary counts for the stats header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub total: usize,
    pub installed: usize,
    pub missing: usize,
}

/// Everything known about a graph's models at one point of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    pub total_required: usize,
    pub installed_count: usize,
    pub missing_count: usize,
    /// Status records by status key.
    pub models: BTreeMap<String, ModelStatusRecord>,
    /// Links resolved so far, by status key.
    pub model_links: BTreeMap<String, Vec<LinkResult>>,
    /// Status keys that had no cached links when the analysis started.
    pub models_to_search: Vec<String>,
    #[serde(rename = "installed_models")]
    pub installed: InstalledInventory,
    #[serde(rename = "extra_model_paths")]
    pub path_config: Option<Value>,
}

impl AnalysisSnapshot {
    pub(crate) fn new(
        total_required: usize,
        reconciliation: &Reconciliation,
        installed: InstalledInventory,
        path_config: Option<Value>,
    ) -> Self {
        Self {
            total_required,
            installed_count: reconciliation.installed.len(),
            missing_count: reconciliation.missing.len(),
            models: reconciliation.by_key.clone(),
            model_links: BTreeMap::new(),
            models_to_search: Vec::new(),
            installed,
            path_config,
        }
    }

    pub fn stats(&self) -> AnalysisStats {
        AnalysisStats {
            total: self.total_required,
            installed: self.installed_count,
            missing: self.missing_count,
        }
    }

    pub fn links(&self, key: &str) -> &[LinkResult] {
        self.model_links.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a missing model is still waiting for its search.
    pub fn is_pending(&self, key: &str) -> bool {
        self.models_to_search.iter().any(|k| k == key) && !self.model_links.contains_key(key)
    }

    /// Fold an incremental search update into the snapshot.
    pub fn apply_update(&mut self, update: &SearchUpdate) {
        if let SearchUpdate::Resolved { key, links, .. } = update {
            self.model_links.insert(key.clone(), links.clone());
        }
    }

    /// Status records in table order.
    pub fn ordered_models(&self) -> Vec<&ModelStatusRecord> {
        presentation::display_order(self.models.values())
    }

    pub fn by_family(&self) -> BTreeMap<String, Vec<&ModelStatusRecord>> {
        presentation::group_by_family(self.models.values())
    }

    pub fn by_type(&self) -> BTreeMap<ModelCategory, Vec<&ModelStatusRecord>> {
        presentation::group_by_type(self.models.values())
    }

    fn recount(&mut self) {
        self.installed_count = self.models.values().filter(|m| m.installed).count();
        self.missing_count = self.models.len() - self.installed_count;
    }
}

/// Phases of a streamed analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", content = "data", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// The graph has no nodes. Terminal.
    NoWorkflow,
    /// Full table with cache hits filled in and the rest pending.
    Initial(AnalysisSnapshot),
    Update(SearchUpdate),
    /// Consolidated result. Terminal.
    Final(AnalysisSnapshot),
    /// Unexpected failure. Terminal.
    Failed { message: String },
}

impl AnalysisEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisEvent::NoWorkflow | AnalysisEvent::Final(_) | AnalysisEvent::Failed { .. }
        )
    }
}

/// The outcome of a completed analysis, kept for later refreshes.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    graph: GraphDocument,
    snapshot: AnalysisSnapshot,
}

impl AnalysisSession {
    pub(crate) fn new(graph: GraphDocument, snapshot: AnalysisSnapshot) -> Self {
        Self { graph, snapshot }
    }

    pub fn graph(&self) -> &GraphDocument {
        &self.graph
    }

    pub fn snapshot(&self) -> &AnalysisSnapshot {
        &self.snapshot
    }

    /// Replace one model's record and links with a refreshed result.
    pub fn apply_refresh(&mut self, refreshed: &RefreshedModel) {
        let key = refreshed.record.key();
        self.snapshot.models.insert(key.clone(), refreshed.record.clone());
        self.snapshot.model_links.insert(key, refreshed.links.clone());
        self.snapshot.recount();
    }
}

/// A single re-resolved model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshedModel {
    pub record: ModelStatusRecord,
    pub links: Vec<LinkResult>,
}
