//! Playback speed ramping and cloud submission for vxcam.
//!
//! Two independent halves:
//!
//! * [`motion`] steers a [`motion::PlaybackDevice`]'s rate toward a target
//!   derived from the clip position, on a fixed 50 ms tick.
//! * [`submission`] runs a clip through signing, upload and remote
//!   processing with a strict status table, publishing every change.
//!
//! The HTTP side lives in [`api`]; each network step is a trait so the
//! orchestrator can run against in-process doubles.
#![allow(missing_docs)]

pub mod api;
pub mod error;
pub mod motion;
pub mod submission;

pub use error::{Result, VxError};
pub use motion::{
    PlaybackDevice, PlaybackSession, RampController, RetimePlan,
    SimulatedDevice,
};
pub use submission::{SubmissionEvent, SubmissionOrchestrator};

pub use vxcam_model as model;
