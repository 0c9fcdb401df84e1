use std::fmt::{self, Display, Formatter};

use crate::ids::{ClipId, JobId};

/// Lifecycle of a cloud submission.
///
/// ```text
/// Idle --submit--> Signing --> Uploading --> Processing --> Completed
/// Idle | Completed | Error --submit--> Signing
/// Signing | Uploading | Processing --failure--> Error
/// Completed --dismiss--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Signing,
    Uploading,
    Processing,
    Completed,
    Error,
}

impl SubmissionStatus {
    /// Whether a network step is currently running.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Signing
                | SubmissionStatus::Uploading
                | SubmissionStatus::Processing
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Completed | SubmissionStatus::Error)
    }

    /// A new job may only start from a resting state.
    pub fn accepts_submit(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Idle
                | SubmissionStatus::Completed
                | SubmissionStatus::Error
        )
    }

    /// The strict transition table. No state may be skipped.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        match (self, next) {
            (Idle | Completed | Error, Signing) => true,
            (Signing, Uploading) => true,
            (Uploading, Processing) => true,
            (Processing, Completed) => true,
            (Signing | Uploading | Processing, Error) => true,
            (Completed, Idle) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "IDLE",
            SubmissionStatus::Signing => "SIGNING",
            SubmissionStatus::Uploading => "UPLOADING",
            SubmissionStatus::Processing => "PROCESSING",
            SubmissionStatus::Completed => "COMPLETED",
            SubmissionStatus::Error => "ERROR",
        }
    }
}

impl Display for SubmissionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of a failed job, so observers can tell connectivity problems apart
/// from server-side rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FailureKind {
    /// No response was received (offline, DNS, CORS, timeout).
    Network,
    /// The API answered with a non-success status.
    Remote,
    /// The storage destination rejected the upload.
    Upload,
    /// The upload stopped reporting progress.
    Stalled,
    /// The caller abandoned the submission before it finished.
    Cancelled,
}

/// Short-lived, single-use destination issued by the signing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UploadTarget {
    #[cfg_attr(feature = "serde", serde(rename = "upload_url"))]
    pub upload_url: String,
    #[cfg_attr(feature = "serde", serde(rename = "gcs_uri"))]
    pub storage_uri: String,
}

/// Rendered assets returned once processing finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessingResult {
    #[cfg_attr(feature = "serde", serde(rename = "youtube_url"))]
    pub primary_asset_url: String,
    #[cfg_attr(feature = "serde", serde(rename = "vertical_url"))]
    pub vertical_asset_url: String,
}

/// Observable state of the one job an orchestrator owns.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmissionJob {
    pub job_id: Option<JobId>,
    pub clip_id: Option<ClipId>,
    pub status: SubmissionStatus,
    /// Upload progress, `0..=100`.
    pub progress_percent: u8,
    pub result: Option<ProcessingResult>,
    pub error: Option<String>,
    pub error_kind: Option<FailureKind>,
}

impl SubmissionJob {
    /// Fresh job entering `Signing`; prior result and error are dropped.
    pub fn signing(job_id: JobId, clip_id: ClipId) -> Self {
        Self {
            job_id: Some(job_id),
            clip_id: Some(clip_id),
            status: SubmissionStatus::Signing,
            ..Self::default()
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.status.is_in_flight()
    }
}
