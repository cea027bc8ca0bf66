//! Name heuristics shared by the graph extractor and the installed-asset classifier.
//!
//! Category inference is an ordered cascade of keyword rules:
//! input-slot name, then node type, then the value itself. Each table is a
//! static slice evaluated top to bottom, first match wins.

use crate::models::ModelCategory;
use regex::Regex;
use std::sync::LazyLock;

/// File extensions recognised as model weights.
pub const MODEL_FILE_EXTENSIONS: &[&str] = &[
    ".safetensors",
    ".ckpt",
    ".pt",
    ".pth",
    ".bin",
    ".onnx",
    ".pb",
    ".tflite",
    ".h5",
    ".pkl",
    ".pth.tar",
];

/// Substrings that mark an extension-less value as a probable model name.
const MODEL_NAME_KEYWORDS: &[&str] = &[
    "model",
    "checkpoint",
    "vae",
    "lora",
    "controlnet",
    "clip",
    "embedding",
];

/// Literal widget values that are never model names.
const REJECTED_LITERALS: &[&str] = &["true", "false", "AUTO"];

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());

/// Keyword table mapping name fragments to model families.
pub const MODEL_FAMILIES: &[(&str, &[&str])] = &[
    ("SDXL", &["sdxl", "xl", "stable-diffusion-xl"]),
    ("SD1.5", &["sd15", "sd-1.5", "stable-diffusion-1.5"]),
    ("SD2", &["sd2", "sd-2", "stable-diffusion-2"]),
    ("SD3", &["sd3", "sd-3", "stable-diffusion-3"]),
    ("Pony", &["pony", "ponydiffusion"]),
    ("Wan", &["wan", "wan2", "wan2.1", "wan2.2", "wan2.3"]),
    ("Flux", &["flux", "flux1", "flux-dev"]),
    ("LTX", &["ltx", "ltx-2", "ltx2"]),
    ("Hunyuan", &["hunyuan"]),
    ("ZImage", &["zimage", "z-image"]),
    ("AnimateDiff", &["animatediff", "animate-diff"]),
    ("SVD", &["svd", "stable-video-diffusion"]),
    ("Kandinsky", &["kandinsky"]),
    ("IF", &["if", "imagen"]),
];

/// Family reported when no keyword matches.
pub const UNKNOWN_FAMILY: &str = crate::config::DisplayConfig::UNKNOWN_FAMILY;

/// A keyword rule: matches when the lowercase subject contains any of `any`,
/// all of `all` and none of `none`.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub any: &'static [&'static str],
    pub all: &'static [&'static str],
    pub none: &'static [&'static str],
    pub category: ModelCategory,
}

impl CategoryRule {
    const fn any(any: &'static [&'static str], category: ModelCategory) -> Self {
        Self {
            any,
            all: &[],
            none: &[],
            category,
        }
    }

    /// Whether the rule matches an already-lowercased subject.
    pub fn matches(&self, subject: &str) -> bool {
        self.any.iter().any(|k| subject.contains(k))
            && self.all.iter().all(|k| subject.contains(k))
            && !self.none.iter().any(|k| subject.contains(k))
    }
}

/// Rules over an input-slot or field name.
pub const SLOT_RULES: &[CategoryRule] = &[
    CategoryRule::any(&["lora"], ModelCategory::Lora),
    CategoryRule::any(&["vae"], ModelCategory::Vae),
    CategoryRule {
        any: &["clip"],
        all: &[],
        none: &["vision"],
        category: ModelCategory::Clip,
    },
    CategoryRule {
        any: &["clip"],
        all: &["vision"],
        none: &[],
        category: ModelCategory::ClipVision,
    },
    CategoryRule::any(&["control"], ModelCategory::ControlNet),
    CategoryRule::any(&["checkpoint", "ckpt"], ModelCategory::MainModel),
    CategoryRule::any(&["upscale"], ModelCategory::UpscaleModel),
    CategoryRule::any(&["ip", "adapter"], ModelCategory::IpAdapter),
    CategoryRule::any(&["text", "t5", "encoder"], ModelCategory::TextEncoder),
    CategoryRule::any(&["sam"], ModelCategory::Other),
];

/// Rules over a node-type identifier.
pub const NODE_TYPE_RULES: &[CategoryRule] = &[
    CategoryRule::any(&["lora"], ModelCategory::Lora),
    CategoryRule::any(&["vae"], ModelCategory::Vae),
    CategoryRule {
        any: &["clip"],
        all: &["vision"],
        none: &[],
        category: ModelCategory::ClipVision,
    },
    CategoryRule::any(&["clip"], ModelCategory::Clip),
    CategoryRule::any(&["control"], ModelCategory::ControlNet),
    CategoryRule::any(&["checkpoint", "ckpt"], ModelCategory::MainModel),
    CategoryRule::any(&["upscale"], ModelCategory::UpscaleModel),
    CategoryRule::any(&["t5", "textencoder", "text_encoder"], ModelCategory::TextEncoder),
    CategoryRule::any(&["sam"], ModelCategory::Other),
];

/// Rules over the candidate value itself.
pub const VALUE_RULES: &[CategoryRule] = &[
    CategoryRule::any(&["lora"], ModelCategory::Lora),
    CategoryRule::any(&["vae"], ModelCategory::Vae),
    CategoryRule::any(&["controlnet", "control"], ModelCategory::ControlNet),
];

/// First matching rule's category, if any.
pub fn first_match(rules: &[CategoryRule], subject: &str) -> Option<ModelCategory> {
    let subject = subject.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&subject))
        .map(|rule| rule.category)
}

/// Infer a category from the slot name, node type and value, in that order.
///
/// A slot rule resolving to `Other` does not end the cascade. A node-type
/// rule always does, so SAM-style detectors stay `Other` regardless of value.
pub fn infer_category(slot: Option<&str>, node_type: &str, value: Option<&str>) -> ModelCategory {
    if let Some(category) = slot.and_then(|s| first_match(SLOT_RULES, s)) {
        if category != ModelCategory::Other {
            return category;
        }
    }
    if let Some(category) = first_match(NODE_TYPE_RULES, node_type) {
        return category;
    }
    value
        .and_then(|v| first_match(VALUE_RULES, v))
        .unwrap_or(ModelCategory::Other)
}

/// Final path segment of a name, split on either separator, trimmed.
pub fn strip_path_prefix(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

pub fn has_model_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    MODEL_FILE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Whether a widget literal plausibly names a model file.
pub fn looks_like_model_file_name(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.chars().count() < 3 {
        return false;
    }
    let file_name = strip_path_prefix(trimmed);
    if has_model_extension(file_name) {
        return true;
    }
    let lower = file_name.to_lowercase();
    MODEL_NAME_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Literals rejected as model names even if they pass the name heuristic.
pub fn is_rejected_literal(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.chars().count() < 3
        || NUMERIC_LITERAL.is_match(trimmed)
        || REJECTED_LITERALS.contains(&trimmed)
}

/// Families whose keywords occur in the model name; `["Unknown"]` if none.
pub fn detect_model_family(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let families: Vec<String> = MODEL_FAMILIES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(family, _)| (*family).to_string())
        .collect();

    if families.is_empty() {
        vec![UNKNOWN_FAMILY.to_string()]
    } else {
        families
    }
}
