//! HTTP collaborators backed by a running ComfyUI host.

use super::client::{endpoint, HttpClient};
use super::providers::{InstalledAssetsProvider, PathConfigProvider};
use crate::config::HostConfig;
use crate::error::Result;
use crate::models::LinkResult;
use crate::search::{LinkSearchBackend, SearchRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Sections of the extra-model-paths response, in preference order.
const PATH_CONFIG_SECTIONS: [&str; 3] = ["merged", "from_folder_paths", "from_yaml_file"];

#[derive(Serialize)]
struct SearchBody<'a> {
    model_name: &'a str,
    model_type: &'a str,
    search_civitai: bool,
    search_hf: bool,
    search_google: bool,
}

impl<'a> From<&'a SearchRequest> for SearchBody<'a> {
    fn from(request: &'a SearchRequest) -> Self {
        Self {
            model_name: &request.model_name,
            model_type: request.model_type.label(),
            search_civitai: request.flags.civitai,
            search_hf: request.flags.huggingface,
            search_google: request.flags.google,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<LinkResult>,
}

/// Pick the path table out of an extra-model-paths response.
pub fn select_path_config(response: Value) -> Option<Value> {
    let Value::Object(mut sections) = response else {
        return None;
    };
    PATH_CONFIG_SECTIONS.iter().find_map(|section| {
        sections
            .remove(*section)
            .filter(|value| !matches!(value, Value::Null | Value::Bool(false)))
    })
}

/// The host's HTTP API: node metadata, extra path table and link search.
#[derive(Debug, Clone)]
pub struct ComfyHost {
    client: HttpClient,
    base_url: String,
    search_timeout: Duration,
}

impl ComfyHost {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(base_url, HttpClient::new()?))
    }

    pub fn with_client(base_url: impl Into<String>, client: HttpClient) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            search_timeout: HostConfig::SEARCH_TIMEOUT,
        }
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }
}

#[async_trait]
impl InstalledAssetsProvider for ComfyHost {
    async fn object_info(&self) -> Result<Value> {
        self.client
            .get_json(&self.url(HostConfig::OBJECT_INFO_PATH))
            .await
    }
}

#[async_trait]
impl PathConfigProvider for ComfyHost {
    async fn path_config(&self) -> Result<Option<Value>> {
        let response: Value = self
            .client
            .get_json(&self.url(HostConfig::EXTRA_MODEL_PATHS_PATH))
            .await?;
        Ok(select_path_config(response))
    }
}

#[async_trait]
impl LinkSearchBackend for ComfyHost {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<LinkResult>> {
        let response: SearchResponse = self
            .client
            .post_json(
                &self.url(HostConfig::SEARCH_PATH),
                &SearchBody::from(request),
                self.search_timeout,
            )
            .await?;
        debug!(
            model = %request.model_name,
            results = response.results.len(),
            "Remote search finished"
        );
        Ok(response.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchFlags;
    use crate::error::FinderError;
    use crate::models::ModelCategory;
    use serde_json::json;

    #[test]
    fn test_select_path_config_preference() {
        let both = json!({"merged": {"vae": "a"}, "from_folder_paths": {"vae": "b"}});
        assert_eq!(select_path_config(both), Some(json!({"vae": "a"})));

        let fallback = json!({"merged": null, "from_yaml_file": {"loras": "c"}});
        assert_eq!(select_path_config(fallback), Some(json!({"loras": "c"})));

        assert_eq!(select_path_config(json!({"merged": null})), None);
        assert_eq!(select_path_config(json!([])), None);
    }

    #[test]
    fn test_search_body_shape() {
        let request = SearchRequest::new(
            "flux1-dev.safetensors",
            ModelCategory::MainModel,
            SearchFlags::default(),
        );
        let body = serde_json::to_value(SearchBody::from(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model_name": "flux1-dev.safetensors",
                "model_type": "Main Model",
                "search_civitai": true,
                "search_hf": true,
                "search_google": false
            })
        );
    }

    #[test]
    fn test_search_response_tolerates_missing_results() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_search_uses_configured_search_timeout() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let host = ComfyHost::new(base_url)
            .unwrap()
            .with_search_timeout(Duration::from_millis(100));

        let request =
            SearchRequest::new("ae.safetensors", ModelCategory::Vae, SearchFlags::default());
        let err = host.search(&request).await.unwrap_err();
        assert!(
            matches!(err, FinderError::Timeout(t) if t == Duration::from_millis(100)),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let client = HttpClient::with_timeout(Duration::from_secs(2)).unwrap();
        let host = ComfyHost::with_client("http://127.0.0.1:1", client);
        let err = host.object_info().await.unwrap_err();
        assert!(err.is_network(), "unexpected error: {err}");
    }
}
