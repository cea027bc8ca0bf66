//! Basic usage example - analyze a workflow against a local host

use findmodels_core::{AnalysisEvent, GraphDocument, ModelFinder, Result};
use futures::StreamExt;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Get workflow path from args or use a sample file
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./workflow.json".to_string());

    println!("Reading workflow: {}", path);
    let json = std::fs::read_to_string(&path)?;
    let graph = GraphDocument::from_json_str(&json)?;

    let finder = Arc::new(ModelFinder::builder().build()?);
    let mut events = Box::pin(finder.analyze(graph));

    while let Some(event) = events.next().await {
        match event {
            AnalysisEvent::NoWorkflow => println!("Workflow has no nodes."),
            AnalysisEvent::Final(snapshot) => {
                println!(
                    "{} required, {} missing:",
                    snapshot.total_required, snapshot.missing_count
                );
                for record in snapshot.ordered_models() {
                    if !record.installed {
                        println!("  - {} ({})", record.name, record.category);
                    }
                }
            }
            AnalysisEvent::Failed { message } => println!("Analysis failed: {}", message),
            _ => {}
        }
    }

    Ok(())
}
