use serde::Serialize;
use vxcam_model::{FailureKind, JobId, ProcessingResult, SubmissionStatus};

/// Published by the orchestrator in the order the changes were applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SubmissionEvent {
    StatusChanged {
        job_id: JobId,
        status: SubmissionStatus,
    },
    Progress {
        job_id: JobId,
        percent: u8,
    },
    Completed {
        job_id: JobId,
        result: ProcessingResult,
    },
    Failed {
        job_id: JobId,
        kind: FailureKind,
        message: String,
    },
}

impl SubmissionEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            SubmissionEvent::StatusChanged { job_id, .. }
            | SubmissionEvent::Progress { job_id, .. }
            | SubmissionEvent::Completed { job_id, .. }
            | SubmissionEvent::Failed { job_id, .. } => *job_id,
        }
    }
}
