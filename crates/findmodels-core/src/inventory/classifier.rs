//! Classification of the host's node metadata into installed model lists.
//!
//! The metadata document is keyed by node type; each entry declares its input
//! fields as `[values, options]` pairs. Well-known loader fields are copied
//! directly, every other model-ish field is classified with the same rule
//! cascade the extractor uses.

use super::string_like::StringLike;
use crate::classification::{has_model_extension, infer_category};
use crate::models::ModelCategory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Loader fields whose option lists are the installed files of a category.
pub const KNOWN_ASSET_FIELDS: &[(&str, &str, ModelCategory)] = &[
    ("CheckpointLoaderSimple", "ckpt_name", ModelCategory::MainModel),
    ("UNETLoader", "unet_name", ModelCategory::MainModel),
    ("VAELoader", "vae_name", ModelCategory::Vae),
    ("CLIPLoader", "clip_name", ModelCategory::Clip),
    ("CLIPVisionLoader", "clip_name", ModelCategory::ClipVision),
    ("ControlNetLoader", "control_net_name", ModelCategory::ControlNet),
    ("IPAdapterModelLoader", "ipadapter_file", ModelCategory::IpAdapter),
    ("LoraLoader", "lora_name", ModelCategory::Lora),
    ("UpscaleModelLoader", "model_name", ModelCategory::UpscaleModel),
    ("UpscalerLoader", "model_name", ModelCategory::UpscaleModel),
];

/// Field-name fragments that make a generic field worth classifying.
const MODEL_FIELD_KEYWORDS: &[&str] = &[
    "model",
    "ckpt",
    "checkpoint",
    "lora",
    "vae",
    "clip",
    "control",
    "upscale",
    "unet",
];

/// Installed model names per category, plus which node types list each name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledInventory {
    pub installed: BTreeMap<ModelCategory, Vec<String>>,
    #[serde(skip)]
    pub vouch: HashMap<(ModelCategory, String), BTreeSet<String>>,
}

impl Default for InstalledInventory {
    fn default() -> Self {
        Self {
            installed: ModelCategory::ALL
                .iter()
                .map(|category| (*category, Vec::new()))
                .collect(),
            vouch: HashMap::new(),
        }
    }
}

impl InstalledInventory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record an installed name, keeping first-seen order without duplicates.
    pub fn add(&mut self, category: ModelCategory, name: &str, node_type: &str) {
        let names = self.installed.entry(category).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        self.vouch
            .entry((category, name.to_string()))
            .or_default()
            .insert(node_type.to_string());
    }

    pub fn names(&self, category: ModelCategory) -> &[String] {
        self.installed
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Node types whose option lists contained `name` under `category`.
    pub fn vouchers(&self, category: ModelCategory, name: &str) -> Option<&BTreeSet<String>> {
        self.vouch.get(&(category, name.to_string()))
    }

    pub fn total(&self) -> usize {
        self.installed.values().map(Vec::len).sum()
    }
}

/// The declared option list of an input field.
///
/// Handles `[[values...], {options}]`, the newer
/// `["COMBO", {"options": [values...]}]` and a bare list.
fn declared_values(field: &Value) -> &[Value] {
    let Some(input_def) = field.as_array() else {
        return &[];
    };
    match input_def.first() {
        Some(Value::Array(values)) => values,
        Some(Value::String(_)) => input_def
            .get(1)
            .and_then(|options| options.get("options"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(input_def),
        _ => input_def,
    }
}

/// Recursively collect model file names, flattening nested lists.
fn collect_model_strings(values: &[Value], out: &mut Vec<String>) {
    for value in values {
        match value {
            Value::Array(nested) => collect_model_strings(nested, out),
            Value::String(_) | Value::Object(_) => {
                if let Some(text) = StringLike::from(value).normalize() {
                    if has_model_extension(&text) && !out.contains(&text) {
                        out.push(text);
                    }
                }
            }
            _ => {}
        }
    }
}

fn input_section<'a>(node: &'a Value, section: &str) -> Option<&'a Map<String, Value>> {
    node.get("input")?.get(section)?.as_object()
}

fn is_known_field(node_type: &str, field: &str) -> bool {
    KNOWN_ASSET_FIELDS
        .iter()
        .any(|(known_node, known_field, _)| *known_node == node_type && *known_field == field)
}

/// Build the installed inventory from the host's node metadata document.
pub fn classify(metadata: &Value) -> InstalledInventory {
    let mut inventory = InstalledInventory::empty();
    let Some(nodes) = metadata.as_object() else {
        warn!("Host metadata is not an object; treating inventory as empty");
        return inventory;
    };

    for (node_type, field, category) in KNOWN_ASSET_FIELDS {
        let Some(declared) = nodes
            .get(*node_type)
            .and_then(|node| input_section(node, "required"))
            .and_then(|required| required.get(*field))
        else {
            continue;
        };
        let names: Vec<String> = declared_values(declared)
            .iter()
            .filter_map(|v| StringLike::from(v).normalize())
            .collect();
        debug!(node_type, field, count = names.len(), "Known loader options");
        for name in &names {
            inventory.add(*category, name, node_type);
        }
    }

    for (node_type, node) in nodes {
        let fields = ["required", "optional"]
            .iter()
            .filter_map(|section| input_section(node, section))
            .flat_map(|section| section.iter());

        for (field, declared) in fields {
            if is_known_field(node_type, field) {
                continue;
            }
            let field_lower = field.to_lowercase();
            if !MODEL_FIELD_KEYWORDS.iter().any(|k| field_lower.contains(k)) {
                continue;
            }

            let mut names = Vec::new();
            collect_model_strings(declared_values(declared), &mut names);
            if names.is_empty() {
                continue;
            }

            let category = infer_category(Some(field.as_str()), node_type, None);
            for name in &names {
                inventory.add(category, name, node_type);
            }
        }
    }

    debug!(total = inventory.total(), "Classified installed models");
    inventory
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_info() -> Value {
        json!({
            "CheckpointLoaderSimple": {
                "input": {"required": {"ckpt_name": [["sdxl_base.safetensors", "sd15/v1-5.ckpt"], {}]}}
            },
            "UpscaleModelLoader": {
                "input": {"required": {"model_name": [["4x-UltraSharp.pth"], {}]}}
            },
            "UpscalerLoader": {
                "input": {"required": {"model_name": [["4x-UltraSharp.pth", "2x.pth"], {}]}}
            },
            "CLIPVisionLoader": {
                "input": {"required": {"clip_name": [["clip_vision_h.safetensors"], {}]}}
            },
            "LoraLoaderModelOnly": {
                "input": {"required": {
                    "model": ["MODEL"],
                    "lora_name": [["detail.safetensors", "notes.txt"], {}],
                    "strength_model": ["FLOAT", {"default": 1.0}]
                }}
            },
            "SAMLoader": {
                "input": {"required": {"model_name": [["sam_vit_b.pth", ["nested/sam_hq.pth"]], {}]}}
            },
            "KSampler": {
                "input": {"required": {"seed": ["INT", {"default": 0}]}}
            }
        })
    }

    #[test]
    fn test_known_fields_are_copied() {
        let inventory = classify(&object_info());
        assert_eq!(
            inventory.names(ModelCategory::MainModel),
            ["sdxl_base.safetensors", "sd15/v1-5.ckpt"]
        );
        assert_eq!(
            inventory.names(ModelCategory::ClipVision),
            ["clip_vision_h.safetensors"]
        );
    }

    #[test]
    fn test_upscalers_union_and_vouch() {
        let inventory = classify(&object_info());
        assert_eq!(
            inventory.names(ModelCategory::UpscaleModel),
            ["4x-UltraSharp.pth", "2x.pth"]
        );
        let vouchers = inventory
            .vouchers(ModelCategory::UpscaleModel, "4x-UltraSharp.pth")
            .unwrap();
        assert!(vouchers.contains("UpscaleModelLoader"));
        assert!(vouchers.contains("UpscalerLoader"));
    }

    #[test]
    fn test_generic_fields_classified_and_filtered() {
        let inventory = classify(&object_info());
        assert_eq!(inventory.names(ModelCategory::Lora), ["detail.safetensors"]);
        // SAMLoader is not a known field pair; its node type pins Other
        assert_eq!(
            inventory.names(ModelCategory::Other),
            ["sam_vit_b.pth", "nested/sam_hq.pth"]
        );
    }

    #[test]
    fn test_combo_options_shape() {
        let inventory = classify(&json!({
            "VAELoader": {
                "input": {"required": {"vae_name": ["COMBO", {"options": ["ae.safetensors"]}]}}
            }
        }));
        assert_eq!(inventory.names(ModelCategory::Vae), ["ae.safetensors"]);
    }

    #[test]
    fn test_object_values_are_coerced() {
        let inventory = classify(&json!({
            "LoraLoader": {
                "input": {"required": {"lora_name": [[{"name": "a.safetensors"}, {"value": "b.safetensors"}], {}]}}
            }
        }));
        assert_eq!(
            inventory.names(ModelCategory::Lora),
            ["a.safetensors", "b.safetensors"]
        );
    }

    #[test]
    fn test_malformed_metadata_is_empty_inventory() {
        let inventory = classify(&json!(["not", "an", "object"]));
        assert_eq!(inventory.total(), 0);
        assert_eq!(inventory.installed.len(), ModelCategory::ALL.len());
    }
}
