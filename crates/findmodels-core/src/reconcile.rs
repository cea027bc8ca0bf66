//! Reconciliation of required models against the installed inventory.
//!
//! Matching walks the installed names once, in inventory order, and takes the
//! first candidate that matches at all: an exact (case-insensitive) match on
//! the file name or full name, or else file-name containment in either
//! direction. Candidates are not scored against each other, so `model_v1` can
//! match an earlier `model_v10` even when an exact entry follows it.

use crate::classification::{detect_model_family, strip_path_prefix};
use crate::config::DirectoryTable;
use crate::graph::RequiredModels;
use crate::inventory::InstalledInventory;
use crate::models::{ModelCategory, ModelStatusRecord, RequirementKey};
use crate::paths::resolve_path;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub installed: Vec<ModelStatusRecord>,
    pub missing: Vec<ModelStatusRecord>,
    /// Every record, keyed by `"<category>:<name>"`.
    pub by_key: BTreeMap<String, ModelStatusRecord>,
}

impl Reconciliation {
    pub fn total(&self) -> usize {
        self.by_key.len()
    }

    fn push(&mut self, record: ModelStatusRecord) {
        self.by_key.insert(record.key(), record.clone());
        if record.installed {
            self.installed.push(record);
        } else {
            self.missing.push(record);
        }
    }
}

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Substring,
}

/// An installed name accepted for a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledMatch {
    /// The matched name (one member of a comma cluster, if clustered).
    pub name: String,
    /// The inventory entry the name came from.
    pub entry: String,
    pub tier: MatchTier,
}

struct Candidate<'a> {
    name: &'a str,
    entry: &'a str,
    full: String,
    file_name: String,
}

fn candidates(entries: &[String]) -> Vec<Candidate<'_>> {
    entries
        .iter()
        .flat_map(|entry| {
            entry
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(move |name| Candidate {
                    name,
                    entry: entry.as_str(),
                    full: name.to_lowercase(),
                    file_name: strip_path_prefix(name).to_lowercase(),
                })
        })
        .filter(|c| !c.file_name.is_empty())
        .collect()
}

/// Find the installed entry satisfying a required name, if any.
pub fn find_installed_match(required_name: &str, entries: &[String]) -> Option<InstalledMatch> {
    let full = required_name.trim().to_lowercase();
    let file_name = strip_path_prefix(required_name).to_lowercase();
    if file_name.is_empty() {
        return None;
    }

    candidates(entries).into_iter().find_map(|c| {
        let tier = if c.file_name == file_name || c.full == full {
            MatchTier::Exact
        } else if c.file_name.contains(&file_name) || file_name.contains(&c.file_name) {
            MatchTier::Substring
        } else {
            return None;
        };
        Some(InstalledMatch {
            name: c.name.to_string(),
            entry: c.entry.to_string(),
            tier,
        })
    })
}

/// Reconcile a single required model.
pub fn reconcile_one(
    category: ModelCategory,
    name: &str,
    inventory: &InstalledInventory,
    usage: &HashMap<RequirementKey, bool>,
    nodes: &HashMap<RequirementKey, Vec<i64>>,
    table: &DirectoryTable,
    path_config: Option<&Value>,
) -> ModelStatusRecord {
    let key = RequirementKey::new(category, name);
    let matched = find_installed_match(name, inventory.names(category));
    if let Some(m) = &matched {
        debug!(model = name, matched = %m.name, tier = ?m.tier, "Matched installed model");
    }

    ModelStatusRecord {
        name: name.to_string(),
        category,
        installed: matched.is_some(),
        local_path: matched
            .as_ref()
            .map(|m| resolve_path(category, &m.name, table, path_config)),
        installed_via: matched
            .as_ref()
            .and_then(|m| inventory.vouchers(category, &m.entry))
            .cloned()
            .unwrap_or_default(),
        matched_installed_name: matched.map(|m| m.name),
        families: detect_model_family(name),
        used: usage.get(&key).copied().unwrap_or(true),
        source_node_ids: nodes.get(&key).cloned().unwrap_or_default(),
    }
}

/// Reconcile every required model against the installed inventory.
pub fn reconcile(
    required: &RequiredModels,
    inventory: &InstalledInventory,
    usage: &HashMap<RequirementKey, bool>,
    nodes: &HashMap<RequirementKey, Vec<i64>>,
    table: &DirectoryTable,
    path_config: Option<&Value>,
) -> Reconciliation {
    let mut result = Reconciliation::default();

    for category in ModelCategory::ALL {
        for requirement in required.in_category(category) {
            if requirement.name.trim().is_empty() {
                warn!(category = %category, "Skipping requirement with an empty name");
                continue;
            }
            result.push(reconcile_one(
                category,
                &requirement.name,
                inventory,
                usage,
                nodes,
                table,
                path_config,
            ));
        }
    }

    debug!(
        installed = result.installed.len(),
        missing = result.missing.len(),
        "Reconciled required models"
    );
    result
}
