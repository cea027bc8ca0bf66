//! Install-path resolution for display.
//!
//! The host may report an external path table (its `extra_model_paths`
//! configuration) keyed by folder name. Entries come in several shapes; only
//! the final directory name is kept, relative to the models root.

use crate::config::DirectoryTable;
use crate::models::{ModelCategory, ModelStatusRecord};
use serde_json::Value;

/// Resolve `<directory>/<model_name>` for a category.
pub fn resolve_path(
    category: ModelCategory,
    model_name: &str,
    table: &DirectoryTable,
    path_config: Option<&Value>,
) -> String {
    let dir = path_config
        .and_then(|config| configured_dir(config, category))
        .unwrap_or_else(|| default_dir(category, table).to_string());
    join(&dir, model_name)
}

/// Directory used when no external entry applies.
pub fn default_dir(category: ModelCategory, table: &DirectoryTable) -> &str {
    table
        .get(category)
        .or_else(|| category.directory_key())
        .unwrap_or(DirectoryTable::FALLBACK_DIR)
}

/// Directory name configured externally for a category, if usable.
pub fn configured_dir(config: &Value, category: ModelCategory) -> Option<String> {
    let table = config
        .get("merged")
        .filter(|merged| merged.is_object())
        .unwrap_or(config);
    let entry = table.get(category.path_config_key())?;
    directory_name(entry_path(entry)?)
}

/// The path string carried by one table entry.
fn entry_path(entry: &Value) -> Option<&str> {
    fn first_str(items: &Vec<Value>) -> Option<&str> {
        items.first().and_then(Value::as_str)
    }
    match entry {
        Value::Object(map) => {
            if let Some(path) = ["default_path", "defaultPath"]
                .iter()
                .filter_map(|field| map.get(*field).and_then(Value::as_str))
                .find(|path| !path.trim().is_empty())
            {
                return Some(path);
            }
            map.get("paths").and_then(Value::as_array).and_then(first_str)
        }
        Value::Array(items) => first_str(items),
        Value::String(path) => Some(path),
        _ => None,
    }
}

/// Reduce a configured path to its directory name.
///
/// `D:\ai\models\checkpoints\` and `/srv/sd/models/checkpoints` both reduce
/// to `checkpoints`.
fn directory_name(path: &str) -> Option<String> {
    let normalized = path.trim().replace('\\', "/");
    let relative = match normalized.rfind("models/") {
        Some(pos) => &normalized[pos + "models/".len()..],
        None => normalized.as_str(),
    };
    let relative = relative.trim_end_matches('/');
    let name = relative.rsplit('/').next().unwrap_or(relative).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn join(dir: &str, model_name: &str) -> String {
    format!(
        "{}/{}",
        dir.trim_end_matches(['/', '\\']),
        model_name.trim_start_matches(['/', '\\'])
    )
}

/// Path shown to the user for an installed model, rooted at `models/`.
pub fn display_path(record: &ModelStatusRecord, table: &DirectoryTable) -> Option<String> {
    if !record.installed {
        return None;
    }
    Some(match &record.local_path {
        Some(local) => format!("models/{}", local),
        None => format!("models/{}/", default_dir(record.category, table)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> DirectoryTable {
        DirectoryTable::default()
    }

    #[test]
    fn test_default_path_keeps_last_segment() {
        let config = json!({"checkpoints": {"default_path": "a/b/c"}});
        assert_eq!(
            resolve_path(ModelCategory::MainModel, "x.safetensors", &table(), Some(&config)),
            "c/x.safetensors"
        );
    }

    #[test]
    fn test_entry_shapes() {
        let cases = [
            json!({"loras": {"defaultPath": "D:\\ai\\models\\loras_xl\\"}}),
            json!({"loras": {"paths": ["/srv/models/loras_xl", "/other"]}}),
            json!({"loras": ["loras_xl"]}),
            json!({"loras": "/home/me/ComfyUI/models/loras_xl"}),
            json!({"merged": {"loras": "loras_xl"}}),
        ];
        for config in cases {
            assert_eq!(
                resolve_path(ModelCategory::Lora, "ink.safetensors", &table(), Some(&config)),
                "loras_xl/ink.safetensors",
                "config: {}",
                config
            );
        }
    }

    #[test]
    fn test_unusable_entries_fall_back() {
        let cases = [
            json!({"vae": {"paths": []}}),
            json!({"vae": []}),
            json!({"vae": 12}),
            json!({"vae": "models/"}),
            json!({"clip": "elsewhere"}),
        ];
        for config in cases {
            assert_eq!(
                resolve_path(ModelCategory::Vae, "ae.safetensors", &table(), Some(&config)),
                "vae/ae.safetensors"
            );
        }
    }

    #[test]
    fn test_fallback_chain() {
        assert_eq!(
            resolve_path(ModelCategory::Other, "sam.pth", &table(), None),
            "checkpoints/sam.pth"
        );
        let custom = table().with_dir(ModelCategory::Other, "ultralytics");
        assert_eq!(
            resolve_path(ModelCategory::Other, "sam.pth", &custom, None),
            "ultralytics/sam.pth"
        );
        let sparse = table().without(ModelCategory::Lora);
        assert_eq!(
            resolve_path(ModelCategory::Lora, "a.safetensors", &sparse, None),
            "loras/a.safetensors"
        );
    }

    #[test]
    fn test_display_path() {
        let mut record = ModelStatusRecord {
            name: "a.safetensors".into(),
            category: ModelCategory::Vae,
            installed: true,
            matched_installed_name: Some("a.safetensors".into()),
            local_path: Some("vae/a.safetensors".into()),
            families: vec!["Unknown".into()],
            used: true,
            source_node_ids: vec![],
            installed_via: Default::default(),
        };
        assert_eq!(display_path(&record, &table()).as_deref(), Some("models/vae/a.safetensors"));
        record.local_path = None;
        assert_eq!(display_path(&record, &table()).as_deref(), Some("models/vae/"));
        record.installed = false;
        assert_eq!(display_path(&record, &table()), None);
    }
}
