//! HTTP clients for the rendering service.
//!
//! Each network step sits behind an `async_trait` seam so the orchestrator
//! can be driven by stubs in tests.

pub mod client;
pub mod processing;
pub mod signing;
pub mod upload;
pub mod wire;

pub use client::{ApiClient, ApiConfig, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT};
pub use processing::{
    HttpProcessingClient, OUTPUT_PREFIX_STEM, OutputPrefixer, ProcessingClient,
};
pub use signing::{HttpSigningClient, SigningClient};
pub use upload::{HttpUploadTransport, ProgressFn, UploadTransport, percent_of};

/// Endpoint paths relative to the API base.
pub mod routes {
    pub const SIGN_UPLOAD: &str = "/sign-upload";
    pub const PROCESS: &str = "/process";
}
