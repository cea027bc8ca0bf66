//! Graph documents and model reference extraction.

pub mod extractor;
pub mod types;

pub use extractor::{extract, is_node_used, Extraction, RequiredModels, MODEL_LOADER_NODES};
pub use types::{GraphDocument, GraphNode, NodeInput, NodeMode, NodeOutput};
