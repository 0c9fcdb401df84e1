//! Cloud submission: sign, upload, process.

pub mod events;
pub mod orchestrator;

pub use events::SubmissionEvent;
pub use orchestrator::SubmissionOrchestrator;
