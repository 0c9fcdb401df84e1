//! Core data model definitions shared across vxcam crates.
#![allow(missing_docs)]

pub mod clip;
pub mod error;
pub mod ids;
pub mod motion;
pub mod style;
pub mod submission;

// Intentionally curated re-exports for downstream consumers.
pub use clip::{Clip, DEFAULT_CONTENT_TYPE, content_type_for_path};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{ClipId, JobId};
pub use motion::{MotionProfile, PlaybackState, RampWindow};
pub use style::VxStyle;
pub use submission::{
    FailureKind, ProcessingResult, SubmissionJob, SubmissionStatus,
    UploadTarget,
};
