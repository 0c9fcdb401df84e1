use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use vxcam_model::UploadTarget;

use super::client::{ApiClient, error_field};
use super::routes;
use super::wire::SignUploadRequest;
use crate::error::Result;

pub(crate) const SIGN_NETWORK_MESSAGE: &str = "Network error or CORS block. Please check your connection or ensure the API is reachable.";

/// Obtains a signed, single-use upload destination.
#[async_trait]
pub trait SigningClient: Send + Sync {
    /// One attempt, no retries.
    async fn sign(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadTarget>;
}

#[derive(Debug, Clone)]
pub struct HttpSigningClient {
    api: Arc<ApiClient>,
}

impl HttpSigningClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SigningClient for HttpSigningClient {
    async fn sign(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadTarget> {
        let url = self.api.build_url(routes::SIGN_UPLOAD);
        debug!(%url, filename, content_type, "requesting signed upload");

        let body = SignUploadRequest {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        };
        let request = self.api.http().post(&url).json(&body);

        let target: UploadTarget = self
            .api
            .execute_json(request, SIGN_NETWORK_MESSAGE, |status, body| {
                error_field(body)
                    .or_else(|| {
                        let text = body.trim();
                        (!text.is_empty()).then(|| text.to_string())
                    })
                    .unwrap_or_else(|| {
                        format!(
                            "Sign upload failed ({}): {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("unknown")
                        )
                    })
            })
            .await?;

        info!(storage_uri = %target.storage_uri, "upload target signed");
        Ok(target)
    }
}
