//! HTTP client for host endpoints.
//!
//! Thin wrapper around reqwest with a default timeout, a fixed user agent and
//! JSON helpers that turn non-2xx responses into [`FinderError::HttpStatus`].

use crate::config::{AppConfig, HostConfig};
use crate::error::{FinderError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client with JSON helpers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_timeout(HostConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| FinderError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// GET a URL and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::send_error("GET", url, self.default_timeout, e))?;
        Self::decode(Self::check_response_status(response, url)?, url).await
    }

    /// POST a JSON body and decode the JSON response, with a per-request timeout.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::send_error("POST", url, timeout, e))?;
        Self::decode(Self::check_response_status(response, url)?, url).await
    }

    /// `timeout` is the limit the failed request actually ran with.
    fn send_error(method: &str, url: &str, timeout: Duration, e: reqwest::Error) -> FinderError {
        if e.is_timeout() {
            return FinderError::Timeout(timeout);
        }
        FinderError::Network {
            message: format!("{} {} failed: {}", method, url, e),
            cause: std::error::Error::source(&e).map(|s| s.to_string()),
        }
    }

    fn check_response_status(response: Response, url: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        debug!(url, status = status.as_u16(), "Host returned an error status");
        Err(FinderError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let bytes = response.bytes().await.map_err(|e| FinderError::Network {
            message: format!("Failed to read response from {}: {}", url, e),
            cause: None,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| FinderError::Json {
            message: format!("Failed to parse response from {}: {}", url, e),
            source: Some(e),
        })
    }
}

/// Join a base URL and an absolute endpoint path.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
