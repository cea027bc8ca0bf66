//! Workflow analysis methods on ModelFinder.

use super::state::{AnalysisEvent, AnalysisSession, AnalysisSnapshot};
use crate::error::Result;
use crate::graph::{extract, GraphDocument};
use crate::inventory::{classify, InstalledInventory};
use crate::reconcile::reconcile;
use crate::ModelFinder;
use futures::Stream;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

impl ModelFinder {
    // ========================================
    // Host State
    // ========================================

    /// Installed models reported by the host, or an empty inventory if the
    /// host cannot be reached.
    pub async fn installed_inventory(&self) -> InstalledInventory {
        match self.assets.object_info().await {
            Ok(metadata) => classify(&metadata),
            Err(e) => {
                warn!(error = %e, "Failed to fetch installed models, assuming none");
                InstalledInventory::empty()
            }
        }
    }

    /// External path table reported by the host, if any.
    pub async fn path_config(&self) -> Option<Value> {
        match self.path_configs.path_config().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to fetch extra model paths, using defaults");
                None
            }
        }
    }

    pub(crate) async fn host_state(&self) -> (InstalledInventory, Option<Value>) {
        tokio::join!(self.installed_inventory(), self.path_config())
    }

    // ========================================
    // Analysis
    // ========================================

    /// Analyze a graph, reporting each phase to `on_event`.
    ///
    /// Emits `NoWorkflow` for a graph without nodes and returns `None`.
    /// Otherwise emits `Initial`, one `Update` per search progress step and
    /// `Final`, and returns the session for later refreshes. Host and search
    /// failures degrade instead of failing the analysis.
    pub async fn analyze_with<F>(
        &self,
        graph: &GraphDocument,
        mut on_event: F,
    ) -> Result<Option<AnalysisSession>>
    where
        F: FnMut(AnalysisEvent) + Send,
    {
        if graph.is_empty() {
            info!("No workflow to analyze");
            on_event(AnalysisEvent::NoWorkflow);
            return Ok(None);
        }

        let extraction = extract(graph);
        let (inventory, path_config) = self.host_state().await;
        debug!(
            required = extraction.required.len(),
            installed = inventory.total(),
            "Collected required and installed models"
        );

        let reconciliation = reconcile(
            &extraction.required,
            &inventory,
            &extraction.usage,
            &extraction.nodes,
            &self.directories,
            path_config.as_ref(),
        );

        let mut snapshot = AnalysisSnapshot::new(
            extraction.required.len(),
            &reconciliation,
            inventory,
            path_config,
        );

        let cache = self.orchestrator.cache();
        let mut to_search = Vec::new();
        for record in &reconciliation.missing {
            match cache.get(&record.name) {
                Some(links) => {
                    snapshot.model_links.insert(record.key(), links);
                }
                None => {
                    snapshot.models_to_search.push(record.key());
                    to_search.push(record.clone());
                }
            }
        }
        info!(
            total = snapshot.total_required,
            missing = snapshot.missing_count,
            to_search = to_search.len(),
            "Workflow analyzed"
        );
        on_event(AnalysisEvent::Initial(snapshot.clone()));

        if !to_search.is_empty() {
            let results = self
                .orchestrator
                .search_missing(&to_search, self.config.concurrency, false, |update| {
                    on_event(AnalysisEvent::Update(update))
                })
                .await;
            snapshot.model_links.extend(results);
        }

        on_event(AnalysisEvent::Final(snapshot.clone()));
        Ok(Some(AnalysisSession::new(graph.clone(), snapshot)))
    }

    /// Analyze a graph as a stream of events.
    ///
    /// The analysis runs on a spawned task and keeps going if the stream is
    /// dropped. The stream ends after a terminal event.
    pub fn analyze(self: Arc<Self>, graph: GraphDocument) -> impl Stream<Item = AnalysisEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        let events = tx.clone();
        let task = tokio::spawn(async move {
            self.analyze_with(&graph, move |event| {
                // receiver gone means nobody is listening any more
                let _ = events.send(event);
            })
            .await
        });

        tokio::spawn(async move {
            let failure = match task.await {
                Ok(Ok(_)) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("Analysis task failed: {}", e)),
            };
            if let Some(message) = failure {
                error!(%message, "Analysis failed");
                let _ = tx.send(AnalysisEvent::Failed { message });
            }
        });

        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
    }
}
