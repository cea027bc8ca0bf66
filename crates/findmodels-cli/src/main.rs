//! Find Models CLI - checks a workflow's models against a running host.
//!
//! Reads a graph document, asks the host which models are installed, and
//! searches for download links to the missing ones.

mod render;
mod settings;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use findmodels_core::{
    AnalysisEvent, GraphDocument, KeyValueStore, MemoryStore, ModelCategory, ModelFinder,
    SearchUpdate, SqliteStore,
};
use futures::StreamExt;
use settings::Overrides;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "findmodels")]
#[command(about = "Find the models a ComfyUI workflow needs and where to get them")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Host base URL (overrides the configuration file)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Searches issued together per chunk
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Also search Google
    #[arg(long, global = true)]
    google: bool,

    /// Directory for the persistent search cache
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Keep search results in memory only
    #[arg(long, global = true)]
    memory_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a workflow file
    Analyze {
        /// Graph document (workflow JSON)
        graph: PathBuf,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Rank rows by how well they match this text
        #[arg(long)]
        query: Option<String>,
    },
    /// Re-check one model, ignoring cached links
    Refresh {
        /// Model file name
        name: String,

        /// Model category, e.g. "lora" or "Main Model"
        #[arg(long, default_value = "Main Model")]
        category: ModelCategory,

        /// Workflow the model belongs to, for usage information
        #[arg(long)]
        graph: Option<PathBuf>,
    },
    /// Remove every cached search result
    ClearCache,
}

fn load_graph(path: &Path) -> Result<GraphDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph document {}", path.display()))?;
    Ok(GraphDocument::from_json_str(&text)?)
}

fn open_store(args: &Args) -> Result<Arc<dyn KeyValueStore>> {
    if args.memory_cache {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let db_path = settings::cache_db_path(args.cache_dir.as_deref())?;
    debug!("Search cache: {}", db_path.display());
    Ok(Arc::new(SqliteStore::new(&db_path)?))
}

async fn analyze(
    finder: Arc<ModelFinder>,
    graph: &Path,
    json: bool,
    query: Option<&str>,
) -> Result<()> {
    let document = load_graph(graph)?;
    let mut events = Box::pin(finder.clone().analyze(document));

    while let Some(event) = events.next().await {
        match event {
            AnalysisEvent::NoWorkflow => {
                println!("No workflow: {} has no nodes", graph.display());
            }
            AnalysisEvent::Initial(snapshot) => {
                info!(
                    "{} models required, {} to search",
                    snapshot.total_required,
                    snapshot.models_to_search.len()
                );
            }
            AnalysisEvent::Update(SearchUpdate::Resolved { name, links, .. }) => {
                info!("Found {} links for {}", links.len(), name);
            }
            AnalysisEvent::Update(SearchUpdate::Loading { key }) => {
                debug!("Searching {}", key);
            }
            AnalysisEvent::Final(snapshot) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                } else {
                    print!("{}", render::render_table(&snapshot, finder.directories(), query));
                }
            }
            AnalysisEvent::Failed { message } => bail!("Analysis failed: {}", message),
        }
    }
    Ok(())
}

async fn refresh(
    finder: &ModelFinder,
    name: &str,
    category: ModelCategory,
    graph: Option<&Path>,
) -> Result<()> {
    let session = match graph {
        Some(path) => finder.analyze_with(&load_graph(path)?, |_| {}).await?,
        None => None,
    };
    let refreshed = finder.refresh_one(session.as_ref(), name, category).await?;

    let mut session = match session {
        Some(session) => session,
        None => {
            println!("{}", serde_json::to_string_pretty(&refreshed)?);
            return Ok(());
        }
    };
    session.apply_refresh(&refreshed);
    print!("{}", render::render_table(session.snapshot(), finder.directories(), Some(name)));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let overrides = Overrides {
        host: args.host.clone(),
        concurrency: args.concurrency,
        google: args.google,
    };
    let config = settings::load_config(args.config.as_deref(), &overrides)?;
    info!("Host: {}", config.host_url);

    let finder = Arc::new(
        ModelFinder::builder()
            .with_config(config)
            .with_store(open_store(&args)?)
            .build()?,
    );

    match &args.command {
        Command::Analyze { graph, json, query } => {
            analyze(finder, graph, *json, query.as_deref()).await
        }
        Command::Refresh {
            name,
            category,
            graph,
        } => refresh(&finder, name, *category, graph.as_deref()).await,
        Command::ClearCache => {
            let removed = finder.cache().clear()?;
            println!("Removed {} cached searches", removed);
            Ok(())
        }
    }
}
