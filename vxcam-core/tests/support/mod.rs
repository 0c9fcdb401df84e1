//! Test doubles for the submission client seams.
#![allow(dead_code)]

use std::io::Write;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Notify;
use vxcam_core::api::{
    ProcessingClient, ProgressFn, SigningClient, UploadTransport,
};
use vxcam_core::{Result, SubmissionOrchestrator, VxError};
use vxcam_model::{Clip, ProcessingResult, UploadTarget, VxStyle};

pub const PRIMARY_URL: &str = "https://video.example.com/watch?v=abc123";
pub const VERTICAL_URL: &str = "https://storage.example.com/out/vertical.mp4";

pub fn upload_target() -> UploadTarget {
    UploadTarget {
        upload_url: "https://storage.example.com/put/clip.mp4?sig=xyz".into(),
        storage_uri: "gs://vx-bucket/uploads/clip.mp4".into(),
    }
}

pub fn processing_result() -> ProcessingResult {
    ProcessingResult {
        primary_asset_url: PRIMARY_URL.into(),
        vertical_asset_url: VERTICAL_URL.into(),
    }
}

/// A small clip file on disk. Keep the returned file alive for the test.
pub fn temp_clip(suffix: &str, bytes: &[u8]) -> (NamedTempFile, Clip) {
    let mut file = tempfile::Builder::new()
        .prefix("session")
        .suffix(suffix)
        .tempfile()
        .expect("temp clip");
    file.write_all(bytes).expect("write clip");
    file.flush().expect("flush clip");
    let clip = Clip::from_path(file.path()).expect("clip from temp file");
    (file, clip)
}

/// A loopback port nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    port
}

type Outcome<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

pub struct StubSigner {
    outcome: Outcome<UploadTarget>,
    pub calls: AtomicUsize,
}

impl StubSigner {
    pub fn ok() -> Self {
        Self::with(|| Ok(upload_target()))
    }

    pub fn with(
        outcome: impl Fn() -> Result<UploadTarget> + Send + Sync + 'static,
    ) -> Self {
        Self {
            outcome: Box::new(outcome),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SigningClient for StubSigner {
    async fn sign(&self, _: &str, _: &str) -> Result<UploadTarget> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

/// Signer that blocks until released, so a job can be held in `Signing`.
#[derive(Default)]
pub struct GatedSigner {
    pub release: Notify,
}

#[async_trait]
impl SigningClient for GatedSigner {
    async fn sign(&self, _: &str, _: &str) -> Result<UploadTarget> {
        self.release.notified().await;
        Ok(upload_target())
    }
}

pub struct StubUploader {
    progress: Vec<u8>,
    failure: Option<u16>,
    pub calls: AtomicUsize,
}

impl StubUploader {
    pub fn reporting(progress: &[u8]) -> Self {
        Self {
            progress: progress.to_vec(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            progress: Vec::new(),
            failure: Some(status),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UploadTransport for StubUploader {
    async fn upload(
        &self,
        _: &UploadTarget,
        _: &Clip,
        on_progress: ProgressFn,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for &percent in &self.progress {
            on_progress(percent);
        }
        match self.failure {
            Some(status) => Err(VxError::Upload { status }),
            None => Ok(()),
        }
    }
}

/// Reports one progress value and then never finishes.
pub struct StallingUploader;

#[async_trait]
impl UploadTransport for StallingUploader {
    async fn upload(
        &self,
        _: &UploadTarget,
        _: &Clip,
        on_progress: ProgressFn,
    ) -> Result<()> {
        on_progress(10);
        std::future::pending::<()>().await;
        Ok(())
    }
}

pub struct StubProcessor {
    outcome: Outcome<ProcessingResult>,
    pub calls: AtomicUsize,
}

impl StubProcessor {
    pub fn ok() -> Self {
        Self::with(|| Ok(processing_result()))
    }

    pub fn with(
        outcome: impl Fn() -> Result<ProcessingResult> + Send + Sync + 'static,
    ) -> Self {
        Self {
            outcome: Box::new(outcome),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProcessingClient for StubProcessor {
    async fn process(&self, _: &str, _: VxStyle) -> Result<ProcessingResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

pub fn orchestrator(
    signer: Arc<dyn SigningClient>,
    uploader: Arc<dyn UploadTransport>,
    processor: Arc<dyn ProcessingClient>,
) -> SubmissionOrchestrator {
    SubmissionOrchestrator::new(signer, uploader, processor)
}
