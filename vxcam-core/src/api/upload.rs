use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Body;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use vxcam_model::{Clip, UploadTarget};

use super::client::ApiClient;
use crate::error::{Result, VxError};

pub(crate) const UPLOAD_NETWORK_MESSAGE: &str =
    "Network error during upload (possible CORS issue)";

const CHUNK_SIZE: usize = 64 * 1024;

/// Receives whole upload percentages. Repeated values are possible.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Moves a clip's bytes to a signed destination.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(
        &self,
        target: &UploadTarget,
        clip: &Clip,
        on_progress: ProgressFn,
    ) -> Result<()>;
}

/// `round(sent / total * 100)`, or `None` when the total is unknown.
pub fn percent_of(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let ratio = sent.min(total) as f64 / total as f64;
    Some((ratio * 100.0).round() as u8)
}

/// Streams the file in a single PUT.
#[derive(Debug, Clone)]
pub struct HttpUploadTransport {
    api: Arc<ApiClient>,
}

impl HttpUploadTransport {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn upload(
        &self,
        target: &UploadTarget,
        clip: &Clip,
        on_progress: ProgressFn,
    ) -> Result<()> {
        let io_error = |source| VxError::Io {
            path: clip.source.clone(),
            source,
        };
        let file = tokio::fs::File::open(&clip.source).await.map_err(io_error)?;
        let total = file.metadata().await.map_err(io_error)?.len();

        debug!(
            clip = %clip.name,
            bytes = total,
            content_type = %clip.content_type,
            "starting upload"
        );

        let sent = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&sent);
        let stream = ReaderStream::with_capacity(file, CHUNK_SIZE).inspect_ok(
            move |chunk| {
                let so_far = counter
                    .fetch_add(chunk.len() as u64, Ordering::Relaxed)
                    + chunk.len() as u64;
                if let Some(percent) = percent_of(so_far, total) {
                    on_progress(percent);
                }
            },
        );

        let response = self
            .api
            .upload_http()
            .put(&target.upload_url)
            .header(CONTENT_TYPE, clip.content_type.as_str())
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "upload got no response");
                VxError::network(UPLOAD_NETWORK_MESSAGE, &err)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "upload rejected");
            return Err(VxError::Upload {
                status: status.as_u16(),
            });
        }

        info!(
            bytes = sent.load(Ordering::Relaxed),
            storage_uri = %target.storage_uri,
            "upload finished"
        );
        Ok(())
    }
}
