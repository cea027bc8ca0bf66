//! Candidate download links returned by the remote search backend.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Where a link was found.
///
/// Serialized as the backend's display strings (`"Civitai"`, `"Hugging Face"`,
/// `"Google"`, `"Google → Civitai"`, ...), so unknown sources survive a cache
/// round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LinkSource {
    Civitai,
    HuggingFace,
    Google,
    /// A Google result that points into another catalog, e.g. `Google → GitHub`.
    GoogleRedirect(String),
    Other(String),
}

const GOOGLE_REDIRECT_SEPARATOR: &str = " → ";

impl LinkSource {
    /// Group order used when listing model page links.
    pub fn display_rank(&self) -> u8 {
        match self {
            LinkSource::Civitai => 0,
            LinkSource::HuggingFace => 1,
            LinkSource::GoogleRedirect(target) => match target.as_str() {
                "Civitai" => 2,
                "Hugging Face" => 3,
                "GitHub" => 4,
                _ => 6,
            },
            LinkSource::Google => 5,
            LinkSource::Other(_) => 6,
        }
    }

    pub fn is_google(&self) -> bool {
        matches!(self, LinkSource::Google | LinkSource::GoogleRedirect(_))
    }

    /// Civitai and Hugging Face are the catalogs that flag non-exact matches.
    pub fn is_catalog(&self) -> bool {
        matches!(self, LinkSource::Civitai | LinkSource::HuggingFace)
    }
}

impl From<String> for LinkSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Civitai" => LinkSource::Civitai,
            "Hugging Face" => LinkSource::HuggingFace,
            "Google" => LinkSource::Google,
            other => match other.strip_prefix("Google").and_then(|rest| {
                rest.strip_prefix(GOOGLE_REDIRECT_SEPARATOR)
                    .or_else(|| rest.strip_prefix(" -> "))
            }) {
                Some(target) => LinkSource::GoogleRedirect(target.to_string()),
                None => LinkSource::Other(value),
            },
        }
    }
}

impl From<LinkSource> for String {
    fn from(source: LinkSource) -> Self {
        source.to_string()
    }
}

impl fmt::Display for LinkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkSource::Civitai => f.write_str("Civitai"),
            LinkSource::HuggingFace => f.write_str("Hugging Face"),
            LinkSource::Google => f.write_str("Google"),
            LinkSource::GoogleRedirect(target) => {
                write!(f, "Google{}{}", GOOGLE_REDIRECT_SEPARATOR, target)
            }
            LinkSource::Other(name) => f.write_str(name),
        }
    }
}

impl Default for LinkSource {
    fn default() -> Self {
        LinkSource::Other(String::new())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One candidate link for a missing model.
///
/// Backend payloads may send `null` for the source or the non-exact flag;
/// both read as their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: LinkSource,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    /// Size in bytes when the catalog reported one.
    #[serde(default)]
    pub file_size: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_non_exact_match: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Fields this crate does not interpret (notes, ids) are kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LinkResult {
    pub fn new(source: LinkSource, url: impl Into<String>) -> Self {
        Self {
            source,
            url: Some(url.into()),
            download_url: None,
            file_size: None,
            is_non_exact_match: false,
            name: None,
            version: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_file_size(mut self, bytes: f64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn non_exact(mut self) -> Self {
        self.is_non_exact_match = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_parsing() {
        assert_eq!(LinkSource::from("Hugging Face".to_string()), LinkSource::HuggingFace);
        assert_eq!(
            LinkSource::from("Google → GitHub".to_string()),
            LinkSource::GoogleRedirect("GitHub".into())
        );
        assert_eq!(
            LinkSource::from("ModelScope".to_string()),
            LinkSource::Other("ModelScope".into())
        );
    }

    #[test]
    fn test_display_rank_order() {
        let mut sources = vec![
            LinkSource::Google,
            LinkSource::Other("x".into()),
            LinkSource::GoogleRedirect("GitHub".into()),
            LinkSource::HuggingFace,
            LinkSource::GoogleRedirect("Civitai".into()),
            LinkSource::Civitai,
        ];
        sources.sort_by_key(|s| s.display_rank());
        assert_eq!(sources[0], LinkSource::Civitai);
        assert_eq!(sources[1], LinkSource::HuggingFace);
        assert_eq!(sources[2], LinkSource::GoogleRedirect("Civitai".into()));
        assert_eq!(sources[4], LinkSource::Google);
    }

    #[test]
    fn test_backend_payload_keeps_unknown_fields() {
        let value = json!({
            "source": "Civitai",
            "name": "Juggernaut XL",
            "url": "https://civitai.com/models/133005",
            "download_url": "https://civitai.com/api/download/models/1",
            "version": "v9",
            "file_size": 6938078334.0,
            "note": "from search"
        });
        let link: LinkResult = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(link.source, LinkSource::Civitai);
        assert!(!link.is_non_exact_match);
        assert_eq!(link.extra.get("note"), Some(&json!("from search")));

        let back = serde_json::to_value(&link).unwrap();
        assert_eq!(back["source"], "Civitai");
        assert_eq!(back["note"], "from search");
    }

    #[test]
    fn test_null_source_and_flag_read_as_defaults() {
        let link: LinkResult = serde_json::from_value(json!({
            "source": null,
            "url": "https://example.com/m.safetensors",
            "is_non_exact_match": null
        }))
        .unwrap();
        assert_eq!(link.source, LinkSource::default());
        assert!(!link.is_non_exact_match);
        assert!(link.extra.is_empty());

        let missing: LinkResult = serde_json::from_value(json!({"url": "u"})).unwrap();
        assert_eq!(missing.source, LinkSource::default());
    }

    #[test]
    fn test_null_file_size() {
        let link: LinkResult =
            serde_json::from_value(json!({"source": "Google", "url": "u", "file_size": null}))
                .unwrap();
        assert_eq!(link.file_size, None);
        assert!(link.source.is_google());
    }
}
