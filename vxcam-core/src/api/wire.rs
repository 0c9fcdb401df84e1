//! JSON bodies exchanged with the rendering service.
//!
//! Responses decode straight into the model's `UploadTarget` and
//! `ProcessingResult`, which carry the wire field names.

use serde::{Deserialize, Serialize};
use vxcam_model::VxStyle;

/// Body of `POST /sign-upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignUploadRequest {
    pub filename: String,
    pub content_type: String,
}

/// Body of `POST /process`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessRequest {
    pub input_uri: String,
    pub style: VxStyle,
    pub output_prefix: String,
}

/// Best-effort shape of an error response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
