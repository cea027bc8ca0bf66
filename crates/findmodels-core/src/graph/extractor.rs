//! Model reference extraction.
//!
//! Two passes over the node list:
//!
//! 1. Known loader nodes: a static table gives the parameter index holding the
//!    model file name and the category it belongs to.
//! 2. Everything else: nodes with an unlinked model-ish input slot have their
//!    literal parameters scanned for values that look like model file names.
//!
//! Both passes merge into the same requirement set keyed by category and
//! canonical file name.

use super::types::{GraphDocument, GraphNode};
use crate::classification::{
    infer_category, is_rejected_literal, looks_like_model_file_name, strip_path_prefix,
};
use crate::models::{ModelCategory, ModelRequirement, RequirementKey};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Known loader node types: `(node type, parameter index, category)`.
pub const MODEL_LOADER_NODES: &[(&str, usize, ModelCategory)] = &[
    ("WanVideoModelLoader", 0, ModelCategory::MainModel),
    ("WanVideoVAELoader", 0, ModelCategory::Vae),
    ("LoadWanVideoT5TextEncoder", 0, ModelCategory::TextEncoder),
    ("WanVideoLoraSelect", 0, ModelCategory::Lora),
    ("CheckpointLoaderSimple", 0, ModelCategory::MainModel),
    ("CheckpointLoader", 0, ModelCategory::MainModel),
    ("UNETLoader", 0, ModelCategory::MainModel),
    ("VAELoader", 0, ModelCategory::Vae),
    ("CLIPLoader", 0, ModelCategory::Clip),
    ("CLIPVisionLoader", 0, ModelCategory::ClipVision),
    ("ControlNetLoader", 0, ModelCategory::ControlNet),
    ("IPAdapterModelLoader", 0, ModelCategory::IpAdapter),
    ("LoraLoader", 0, ModelCategory::Lora),
    ("UpscaleModelLoader", 0, ModelCategory::UpscaleModel),
    ("UpscalerLoader", 0, ModelCategory::UpscaleModel),
    // Efficiency Nodes keeps the upscaler in the fourth widget.
    ("HighRes-Fix Script", 3, ModelCategory::UpscaleModel),
    ("SAMLoader", 0, ModelCategory::Other),
    ("UltralyticsDetectorProvider", 0, ModelCategory::Other),
    ("ModelLoader", 0, ModelCategory::Other),
    ("VAELoaderSimple", 0, ModelCategory::Vae),
];

/// Input-slot fragments that mark a node as a possible model loader.
const MODEL_SLOT_KEYWORDS: &[&str] = &["model", "ckpt", "lora", "vae", "checkpoint"];

/// Look up a node type in [`MODEL_LOADER_NODES`].
pub fn known_loader(node_type: &str) -> Option<(usize, ModelCategory)> {
    MODEL_LOADER_NODES
        .iter()
        .find(|(name, _, _)| *name == node_type)
        .map(|(_, index, category)| (*index, *category))
}

/// A node is used when it is active and wired into the graph.
pub fn is_node_used(node: &GraphNode) -> bool {
    !node.mode.is_inactive() && (node.has_connected_output() || node.has_connected_input())
}

/// Required models in first-seen order, unique per [`RequirementKey`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequiredModels {
    entries: Vec<ModelRequirement>,
    index: HashMap<RequirementKey, usize>,
}

impl RequiredModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a requirement, or merge usage and node ids into an existing one.
    pub fn merge(
        &mut self,
        category: ModelCategory,
        name: &str,
        node_id: Option<i64>,
        used: bool,
    ) {
        let key = RequirementKey::new(category, name);
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                self.entries.push(ModelRequirement {
                    name: name.to_string(),
                    category,
                    source_node_ids: Vec::new(),
                    used: false,
                });
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[position];
        entry.used |= used;
        if let Some(id) = node_id {
            if !entry.source_node_ids.contains(&id) {
                entry.source_node_ids.push(id);
            }
        }
    }

    pub fn get(&self, key: &RequirementKey) -> Option<&ModelRequirement> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelRequirement> {
        self.entries.iter()
    }

    pub fn in_category(&self, category: ModelCategory) -> impl Iterator<Item = &ModelRequirement> {
        self.entries.iter().filter(move |r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ModelRequirement> for RequiredModels {
    fn from_iter<I: IntoIterator<Item = ModelRequirement>>(iter: I) -> Self {
        let mut required = RequiredModels::new();
        for requirement in iter {
            if requirement.source_node_ids.is_empty() {
                required.merge(requirement.category, &requirement.name, None, requirement.used);
            }
            for id in &requirement.source_node_ids {
                required.merge(
                    requirement.category,
                    &requirement.name,
                    Some(*id),
                    requirement.used,
                );
            }
        }
        required
    }
}

/// Extraction output: the requirements plus their usage and node maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub required: RequiredModels,
    pub usage: HashMap<RequirementKey, bool>,
    pub nodes: HashMap<RequirementKey, Vec<i64>>,
}

impl Extraction {
    fn from_required(required: RequiredModels) -> Self {
        let usage = required.iter().map(|r| (r.key(), r.used)).collect();
        let nodes = required
            .iter()
            .map(|r| (r.key(), r.source_node_ids.clone()))
            .collect();
        Self {
            required,
            usage,
            nodes,
        }
    }
}

/// Extract every model reference from a graph document.
pub fn extract(document: &GraphDocument) -> Extraction {
    let nodes = document.parsed_nodes();
    let mut required = RequiredModels::new();

    for node in &nodes {
        if let Some((index, category)) = known_loader(&node.node_type) {
            extract_known_loader(node, index, category, &mut required);
        }
    }

    for node in nodes.iter().filter(|n| known_loader(&n.node_type).is_none()) {
        scan_node(node, &mut required);
    }

    debug!(
        nodes = nodes.len(),
        required = required.len(),
        "Extracted model requirements"
    );
    Extraction::from_required(required)
}

fn extract_known_loader(
    node: &GraphNode,
    index: usize,
    category: ModelCategory,
    required: &mut RequiredModels,
) {
    let raw = match node.widgets_values.get(index) {
        None | Some(Value::Null) => return,
        Some(Value::String(s)) => s,
        Some(other) => {
            warn!(
                node_id = ?node.id,
                node_type = %node.node_type,
                "Ignoring non-string model name: {}",
                other
            );
            return;
        }
    };

    let name = strip_path_prefix(raw.trim());
    if name.is_empty() {
        return;
    }

    let used = is_node_used(node);
    if !used {
        debug!(
            node_id = ?node.id,
            node_type = %node.node_type,
            model = name,
            "Model loader is unused"
        );
    }
    required.merge(category, name, node.id, used);
}

/// Literal-backed input slots paired with their parameter positions.
fn literal_slot_positions(node: &GraphNode) -> Vec<(&str, usize)> {
    node.inputs
        .iter()
        .filter(|input| input.is_literal())
        .map(|input| input.name.as_str())
        .zip(0..node.widgets_values.len())
        .collect()
}

fn scan_node(node: &GraphNode, required: &mut RequiredModels) {
    let has_model_slot = node.inputs.iter().any(|input| {
        let name = input.name.to_lowercase();
        !input.linked && MODEL_SLOT_KEYWORDS.iter().any(|k| name.contains(k))
    });
    if !has_model_slot || node.widgets_values.is_empty() {
        return;
    }

    let used = is_node_used(node);
    for (slot, position) in literal_slot_positions(node) {
        let Some(value) = node.widgets_values[position].as_str() else {
            continue;
        };
        if !looks_like_model_file_name(value) {
            continue;
        }

        let name = strip_path_prefix(value);
        if is_rejected_literal(name) {
            continue;
        }

        let category = infer_category(Some(slot), &node.node_type, Some(name));
        debug!(
            node_id = ?node.id,
            node_type = %node.node_type,
            position,
            model = name,
            category = %category,
            "Detected model in generic node"
        );
        required.merge(category, name, node.id, used);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(nodes: Vec<Value>) -> GraphDocument {
        GraphDocument::new(nodes)
    }

    fn checkpoint_node(id: i64, mode: i64, name: &str) -> Value {
        json!({
            "id": id,
            "type": "CheckpointLoaderSimple",
            "mode": mode,
            "widgets_values": [name],
            "outputs": [{"links": [1]}, {"links": []}]
        })
    }

    #[test]
    fn test_known_loader_used() {
        let extraction = extract(&doc(vec![checkpoint_node(1, 0, "sdxl_base.safetensors")]));
        let key = RequirementKey::new(ModelCategory::MainModel, "sdxl_base.safetensors");
        let requirement = extraction.required.get(&key).unwrap();
        assert!(requirement.used);
        assert_eq!(requirement.source_node_ids, vec![1]);
        assert!(extraction.usage[&key]);
    }

    #[test]
    fn test_disabled_loader_recorded_unused() {
        let extraction = extract(&doc(vec![checkpoint_node(1, 2, "sdxl_base.safetensors")]));
        let key = RequirementKey::new(ModelCategory::MainModel, "sdxl_base.safetensors");
        assert!(!extraction.required.get(&key).unwrap().used);
        assert!(!extraction.usage[&key]);
    }

    #[test]
    fn test_path_prefix_is_stripped_and_duplicates_merge() {
        let extraction = extract(&doc(vec![
            checkpoint_node(1, 2, "SDXL/base.safetensors"),
            checkpoint_node(5, 0, r"other\base.safetensors"),
            checkpoint_node(5, 0, "base.safetensors"),
        ]));
        assert_eq!(extraction.required.len(), 1);
        let key = RequirementKey::new(ModelCategory::MainModel, "base.safetensors");
        assert!(extraction.usage[&key]);
        assert_eq!(extraction.nodes[&key], vec![1, 5]);
    }

    #[test]
    fn test_high_res_fix_reads_fourth_widget() {
        let extraction = extract(&doc(vec![json!({
            "id": 9,
            "type": "HighRes-Fix Script",
            "widgets_values": ["latent", "(use same)", 1.5, "4x-UltraSharp.pth"],
            "outputs": [{"links": [4]}]
        })]));
        let key = RequirementKey::new(ModelCategory::UpscaleModel, "4x-UltraSharp.pth");
        assert!(extraction.required.get(&key).is_some());
    }

    #[test]
    fn test_unwired_node_is_unused() {
        let node = GraphNode::from_value(&json!({
            "id": 1, "type": "VAELoader", "outputs": [{"links": null}]
        }))
        .unwrap();
        assert!(!is_node_used(&node));

        let node = GraphNode::from_value(&json!({
            "id": 1, "type": "X", "inputs": [{"name": "a", "link": 7}]
        }))
        .unwrap();
        assert!(is_node_used(&node));
    }

    #[test]
    fn test_non_string_known_value_is_skipped() {
        let extraction = extract(&doc(vec![json!({
            "id": 3,
            "type": "LoraLoader",
            "widgets_values": [42, 1.0, 1.0]
        })]));
        assert!(extraction.required.is_empty());
    }

    #[test]
    fn test_generic_scan_uses_slot_names() {
        let extraction = extract(&doc(vec![json!({
            "id": 12,
            "type": "Power Lora Stack",
            "mode": 0,
            "inputs": [
                {"name": "model", "link": 4},
                {"name": "strength", "link": null, "widget": {"name": "strength"}},
                {"name": "vae_name", "link": null, "widget": {"name": "vae_name"}},
                {"name": "lora_name", "link": null, "widget": {"name": "lora_name"}}
            ],
            "widgets_values": [0.8, "sdxl_vae.safetensors", "styles/ink_lora.safetensors"],
            "outputs": [{"links": [9]}]
        })]));

        let vae = RequirementKey::new(ModelCategory::Vae, "sdxl_vae.safetensors");
        let lora = RequirementKey::new(ModelCategory::Lora, "ink_lora.safetensors");
        assert!(extraction.required.get(&vae).is_some());
        assert!(extraction.required.get(&lora).is_some());
        assert_eq!(extraction.nodes[&lora], vec![12]);
        assert_eq!(extraction.required.len(), 2);
    }

    #[test]
    fn test_generic_scan_needs_unlinked_model_slot() {
        let extraction = extract(&doc(vec![json!({
            "id": 2,
            "type": "KSampler",
            "inputs": [
                {"name": "model", "link": 1},
                {"name": "sampler", "link": null, "widget": {"name": "sampler"}}
            ],
            "widgets_values": ["model_x.safetensors"]
        })]));
        assert!(extraction.required.is_empty());
    }

    #[test]
    fn test_generic_scan_rejects_literals() {
        let extraction = extract(&doc(vec![json!({
            "id": 2,
            "type": "SomeModelNode",
            "inputs": [
                {"name": "model_name", "link": null, "widget": {"name": "model_name"}},
                {"name": "flag", "link": null, "widget": {"name": "flag"}}
            ],
            "widgets_values": ["AUTO", "true"]
        })]));
        assert!(extraction.required.is_empty());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let document = doc(vec![
            checkpoint_node(1, 0, "a.safetensors"),
            checkpoint_node(2, 4, "b.safetensors"),
        ]);
        assert_eq!(extract(&document), extract(&document));
    }
}
