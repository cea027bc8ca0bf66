//! The model category taxonomy shared by the extractor, classifier and resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Functional role of a model file inside a workflow.
///
/// The declaration order is the display order of the category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelCategory {
    #[serde(rename = "Main Model")]
    MainModel,
    #[serde(rename = "VAE")]
    Vae,
    #[serde(rename = "Text Encoder")]
    TextEncoder,
    #[serde(rename = "CLIP")]
    Clip,
    #[serde(rename = "CLIP Vision")]
    ClipVision,
    #[serde(rename = "ControlNet")]
    ControlNet,
    #[serde(rename = "IP-Adapter")]
    IpAdapter,
    #[serde(rename = "LoRA")]
    Lora,
    #[serde(rename = "Upscale Model")]
    UpscaleModel,
    #[serde(rename = "Other")]
    Other,
}

impl ModelCategory {
    pub const ALL: [ModelCategory; 10] = [
        ModelCategory::MainModel,
        ModelCategory::Vae,
        ModelCategory::TextEncoder,
        ModelCategory::Clip,
        ModelCategory::ClipVision,
        ModelCategory::ControlNet,
        ModelCategory::IpAdapter,
        ModelCategory::Lora,
        ModelCategory::UpscaleModel,
        ModelCategory::Other,
    ];

    /// Human-readable label, also used in status keys.
    pub fn label(&self) -> &'static str {
        match self {
            ModelCategory::MainModel => "Main Model",
            ModelCategory::Vae => "VAE",
            ModelCategory::TextEncoder => "Text Encoder",
            ModelCategory::Clip => "CLIP",
            ModelCategory::ClipVision => "CLIP Vision",
            ModelCategory::ControlNet => "ControlNet",
            ModelCategory::IpAdapter => "IP-Adapter",
            ModelCategory::Lora => "LoRA",
            ModelCategory::UpscaleModel => "Upscale Model",
            ModelCategory::Other => "Other",
        }
    }

    /// The host's folder name for this category, if it has a dedicated one.
    pub fn directory_key(&self) -> Option<&'static str> {
        let key = match self {
            ModelCategory::MainModel => "checkpoints",
            ModelCategory::Vae => "vae",
            ModelCategory::TextEncoder => "text_encoders",
            ModelCategory::Clip => "clip",
            ModelCategory::ClipVision => "clip_vision",
            ModelCategory::ControlNet => "controlnet",
            ModelCategory::IpAdapter => "ipadapter",
            ModelCategory::Lora => "loras",
            ModelCategory::UpscaleModel => "upscale_models",
            ModelCategory::Other => return None,
        };
        Some(key)
    }

    /// Key under which an external path table configures this category.
    pub fn path_config_key(&self) -> String {
        self.directory_key()
            .map(str::to_string)
            .unwrap_or_else(|| self.label().to_lowercase())
    }
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelCategory {
    type Err = crate::FinderError;

    /// Parse a label or common alias, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-', ' '], "");
        let category = match normalized.as_str() {
            "mainmodel" | "main" | "checkpoint" | "checkpoints" | "unet" => {
                ModelCategory::MainModel
            }
            "vae" => ModelCategory::Vae,
            "textencoder" | "textencoders" | "t5" => ModelCategory::TextEncoder,
            "clip" => ModelCategory::Clip,
            "clipvision" => ModelCategory::ClipVision,
            "controlnet" => ModelCategory::ControlNet,
            "ipadapter" => ModelCategory::IpAdapter,
            "lora" | "loras" => ModelCategory::Lora,
            "upscalemodel" | "upscale" | "upscalemodels" | "upscaler" => {
                ModelCategory::UpscaleModel
            }
            "other" => ModelCategory::Other,
            _ => {
                return Err(crate::FinderError::Validation {
                    field: "category".into(),
                    message: format!("unknown model category '{}'", s),
                })
            }
        };
        Ok(category)
    }
}
