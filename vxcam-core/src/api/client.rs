use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::wire::ErrorBody;
use crate::error::{Result, VxError};

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";

/// Default timeout for the JSON API calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the rendering service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    /// Fail an upload that reports no progress for this long. `None` waits
    /// indefinitely.
    pub upload_stall_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_BASE)
                .expect("default base URL parses"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_stall_timeout: None,
        }
    }
}

/// HTTP client shared by the signing, upload and processing calls.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    upload_client: Client,
    config: ApiConfig,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("request_timeout", &self.config.request_timeout)
            .field("upload_stall_timeout", &self.config.upload_stall_timeout)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(VxError::HttpClient)?;

        // Uploads can legitimately run for minutes; only the connect phase
        // is bounded here.
        let upload_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(VxError::HttpClient)?;

        info!(
            base_url = %config.base_url,
            "[ApiClient] Creating API client"
        );

        Ok(Self {
            client,
            upload_client,
            config,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Join an endpoint path onto the base URL.
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let p = path.as_ref();
        if p.starts_with("http://") || p.starts_with("https://") {
            return p.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            p.trim_start_matches('/')
        )
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn upload_http(&self) -> &Client {
        &self.upload_client
    }

    /// Send a JSON request and decode a JSON success body.
    ///
    /// A send failure becomes [`VxError::Network`] carrying
    /// `network_message`. A non-success status becomes [`VxError::Remote`]
    /// whose message `describe` builds from the status and raw body.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        network_message: &str,
        describe: impl FnOnce(StatusCode, &str) -> String,
    ) -> Result<T> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "[ApiClient] request got no response");
                VxError::network(network_message, &err)
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "[ApiClient] response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe(status, &body);
            return Err(VxError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| VxError::network(network_message, &err))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| VxError::Decode(err.to_string()))
    }
}

/// The `error` field of a JSON error body, when there is one.
pub(crate) fn error_field(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.trim().is_empty())
}
