//! Requirement and status records produced by extraction and reconciliation.

use super::ModelCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identity of a required model: its category plus its canonical file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequirementKey {
    pub category: ModelCategory,
    pub name: String,
}

impl RequirementKey {
    pub fn new(category: ModelCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }

    /// The `"<category label>:<name>"` form used to index status records.
    pub fn status_key(&self) -> String {
        status_key(self.category, &self.name)
    }
}

/// Build the status-record key for a category and model name.
pub fn status_key(category: ModelCategory, name: &str) -> String {
    format!("{}:{}", category.label(), name)
}

/// A model file referenced by the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequirement {
    pub name: String,
    pub category: ModelCategory,
    /// Ids of the nodes that reference this model, in first-seen order.
    pub source_node_ids: Vec<i64>,
    pub used: bool,
}

impl ModelRequirement {
    pub fn key(&self) -> RequirementKey {
        RequirementKey::new(self.category, self.name.clone())
    }
}

/// Reconciliation outcome for one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatusRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub category: ModelCategory,
    pub installed: bool,
    pub matched_installed_name: Option<String>,
    /// Install location relative to the host's models directory.
    pub local_path: Option<String>,
    pub families: Vec<String>,
    pub used: bool,
    pub source_node_ids: Vec<i64>,
    /// Host node types whose option lists contained the matched name.
    #[serde(default)]
    pub installed_via: BTreeSet<String>,
}

impl ModelStatusRecord {
    pub fn key(&self) -> String {
        status_key(self.category, &self.name)
    }

    pub fn requirement_key(&self) -> RequirementKey {
        RequirementKey::new(self.category, self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_key_format() {
        let key = RequirementKey::new(ModelCategory::MainModel, "sdxl_base.safetensors");
        assert_eq!(key.status_key(), "Main Model:sdxl_base.safetensors");
        assert_eq!(
            status_key(ModelCategory::Lora, "detail.safetensors"),
            "LoRA:detail.safetensors"
        );
    }
}
