use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use vxcam_model::{FailureKind, ModelError, SubmissionStatus};

#[derive(Error, Debug)]
pub enum VxError {
    /// The request never got a response: offline, DNS, CORS preflight,
    /// timeout.
    #[error("{message}")]
    Network { message: String, detail: String },

    /// The API answered with a non-success status.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error(
        "Upload failed with status {status}. This usually means a signature mismatch."
    )]
    Upload { status: u16 },

    #[error("Upload stalled: no progress for {after:?}")]
    Stalled { after: Duration },

    #[error("Submission was cancelled before it finished")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(#[from] ModelError),

    #[error("a submission is already in flight ({status})")]
    SubmissionInFlight { status: SubmissionStatus },

    #[error("invalid transition {from} -> {to}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl VxError {
    pub(crate) fn network(message: &str, source: &reqwest::Error) -> Self {
        VxError::Network {
            message: message.to_string(),
            detail: source.to_string(),
        }
    }

    /// The single line shown to a user for this failure. Remote errors show
    /// the server's message verbatim.
    pub fn user_message(&self) -> String {
        match self {
            VxError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// How a failed job is classified for observers.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            VxError::Network { .. } => FailureKind::Network,
            VxError::Upload { .. } | VxError::Io { .. } => FailureKind::Upload,
            VxError::Stalled { .. } => FailureKind::Stalled,
            VxError::Cancelled => FailureKind::Cancelled,
            _ => FailureKind::Remote,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, VxError::Network { .. })
    }
}

pub type Result<T> = std::result::Result<T, VxError>;
