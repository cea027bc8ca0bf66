//! Link search for missing models.

mod backend;
mod orchestrator;

pub use backend::{LinkSearchBackend, SearchRequest};
pub use orchestrator::{plan_chunks, SearchOrchestrator, SearchUpdate};
