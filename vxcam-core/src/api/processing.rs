use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};
use vxcam_model::{ProcessingResult, VxStyle};

use super::client::{ApiClient, error_field};
use super::routes;
use super::wire::ProcessRequest;
use crate::error::Result;

pub(crate) const PROCESS_NETWORK_MESSAGE: &str = "Processing request blocked by network/CORS. Check if the backend is online.";

/// Prefix shared by every render output name.
pub const OUTPUT_PREFIX_STEM: &str = "vx_edit_";

/// Asks the service to render a previously uploaded object.
#[async_trait]
pub trait ProcessingClient: Send + Sync {
    async fn process(
        &self,
        storage_uri: &str,
        style: VxStyle,
    ) -> Result<ProcessingResult>;
}

/// Millisecond-clock output prefixes that never repeat within a process,
/// even when two calls land in the same millisecond.
#[derive(Debug, Default)]
pub struct OutputPrefixer {
    last: AtomicI64,
}

impl OutputPrefixer {
    /// Next prefix, strictly greater than every one handed out before.
    pub fn next(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        format!("{OUTPUT_PREFIX_STEM}{}", now.max(previous + 1))
    }
}

#[derive(Debug)]
pub struct HttpProcessingClient {
    api: Arc<ApiClient>,
    prefixes: OutputPrefixer,
}

impl HttpProcessingClient {
    /// Processing client sharing `api`'s connection pool.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            prefixes: OutputPrefixer::default(),
        }
    }
}

#[async_trait]
impl ProcessingClient for HttpProcessingClient {
    async fn process(
        &self,
        storage_uri: &str,
        style: VxStyle,
    ) -> Result<ProcessingResult> {
        let url = self.api.build_url(routes::PROCESS);
        let body = ProcessRequest {
            input_uri: storage_uri.to_string(),
            style,
            output_prefix: self.prefixes.next(),
        };
        debug!(%url, %style, prefix = %body.output_prefix, "requesting render");

        let request = self.api.http().post(&url).json(&body);
        let result: ProcessingResult = self
            .api
            .execute_json(request, PROCESS_NETWORK_MESSAGE, |status, body| {
                error_field(body).unwrap_or_else(|| {
                    format!(
                        "Processing failed with status {}",
                        status.as_u16()
                    )
                })
            })
            .await?;

        info!(
            primary = %result.primary_asset_url,
            vertical = %result.vertical_asset_url,
            "render finished"
        );
        Ok(result)
    }
}
