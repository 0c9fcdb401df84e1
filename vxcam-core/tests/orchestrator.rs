mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use support::*;
use tokio::sync::broadcast;
use url::Url;
use vxcam_core::api::{ApiClient, ApiConfig};
use vxcam_core::{SubmissionEvent, SubmissionOrchestrator, VxError};
use vxcam_model::{FailureKind, SubmissionStatus, VxStyle};

fn drain(events: &mut broadcast::Receiver<SubmissionEvent>) -> Vec<SubmissionEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn statuses(events: &[SubmissionEvent]) -> Vec<SubmissionStatus> {
    events
        .iter()
        .filter_map(|event| match event {
            SubmissionEvent::StatusChanged { status, .. } => Some(*status),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn all_steps_succeed_and_complete() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let orchestrator = orchestrator(
        Arc::new(StubSigner::ok()),
        Arc::new(StubUploader::reporting(&[100])),
        Arc::new(StubProcessor::ok()),
    );
    let mut events = orchestrator.events();

    let job = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .expect("job completes");

    assert_eq!(job.status, SubmissionStatus::Completed);
    assert_eq!(job.clip_id, Some(clip.id));
    assert_eq!(job.error, None);
    let result = job.result.expect("result recorded");
    assert_eq!(result.primary_asset_url, PRIMARY_URL);
    assert_eq!(result.vertical_asset_url, VERTICAL_URL);

    let seen = drain(&mut events);
    assert_eq!(
        statuses(&seen),
        vec![
            SubmissionStatus::Signing,
            SubmissionStatus::Uploading,
            SubmissionStatus::Processing,
            SubmissionStatus::Completed,
        ]
    );
    assert!(matches!(
        seen.last(),
        Some(SubmissionEvent::Completed { result, .. }) if result.primary_asset_url == PRIMARY_URL
    ));
    assert!(seen.iter().all(|e| Some(e.job_id()) == job.job_id));
}

#[tokio::test]
async fn progress_is_published_in_order_before_processing() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let orchestrator = orchestrator(
        Arc::new(StubSigner::ok()),
        Arc::new(StubUploader::reporting(&[10, 47, 47, 100])),
        Arc::new(StubProcessor::ok()),
    );
    let mut events = orchestrator.events();

    orchestrator
        .submit(&clip, VxStyle::FisheyeDynamic)
        .await
        .expect("job completes");

    let tail: Vec<_> = drain(&mut events)
        .into_iter()
        .skip_while(|e| {
            !matches!(
                e,
                SubmissionEvent::StatusChanged {
                    status: SubmissionStatus::Uploading,
                    ..
                }
            )
        })
        .skip(1)
        .take(4)
        .collect();

    let progress: Vec<u8> = tail
        .iter()
        .filter_map(|e| match e {
            SubmissionEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![10, 47, 100]);
    assert!(matches!(
        tail.last(),
        Some(SubmissionEvent::StatusChanged {
            status: SubmissionStatus::Processing,
            ..
        })
    ));
    assert_eq!(orchestrator.snapshot().progress_percent, 100);
}

#[tokio::test]
async fn remote_sign_error_surfaces_server_message() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let uploader = Arc::new(StubUploader::reporting(&[100]));
    let processor = Arc::new(StubProcessor::ok());
    let orchestrator = orchestrator(
        Arc::new(StubSigner::with(|| {
            Err(VxError::Remote {
                status: 500,
                message: "bad filename".into(),
            })
        })),
        uploader.clone(),
        processor.clone(),
    );
    let mut events = orchestrator.events();

    let err = orchestrator
        .submit(&clip, VxStyle::RawMk1)
        .await
        .expect_err("signing fails");
    assert!(matches!(err, VxError::Remote { status: 500, .. }));

    let job = orchestrator.snapshot();
    assert_eq!(job.status, SubmissionStatus::Error);
    assert_eq!(job.error.as_deref(), Some("bad filename"));
    assert_eq!(job.error_kind, Some(FailureKind::Remote));
    assert_eq!(uploader.calls.load(Ordering::SeqCst), 0);
    assert_eq!(processor.calls.load(Ordering::SeqCst), 0);

    let seen = drain(&mut events);
    assert_eq!(
        statuses(&seen),
        vec![SubmissionStatus::Signing, SubmissionStatus::Error]
    );
    assert!(matches!(
        seen.last(),
        Some(SubmissionEvent::Failed { kind: FailureKind::Remote, message, .. })
            if message == "bad filename"
    ));
}

#[tokio::test]
async fn unreachable_api_is_a_network_failure() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let api = ApiClient::new(ApiConfig {
        base_url: Url::parse(&format!("http://127.0.0.1:{}", closed_port()))
            .unwrap(),
        request_timeout: Duration::from_secs(5),
        upload_stall_timeout: None,
    })
    .unwrap();
    let orchestrator = SubmissionOrchestrator::from_api(Arc::new(api));

    let err = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .expect_err("nothing is listening");
    assert!(err.is_network(), "unexpected error: {err:?}");

    let job = orchestrator.snapshot();
    assert_eq!(job.status, SubmissionStatus::Error);
    assert_eq!(job.error_kind, Some(FailureKind::Network));
    let message = job.error.expect("message stored");
    assert!(message.contains("Network error"), "{message}");
    assert_ne!(message, "bad filename");
}

#[tokio::test]
async fn upload_rejection_skips_processing() {
    let (_file, clip) = temp_clip(".mov", b"frames");
    let processor = Arc::new(StubProcessor::ok());
    let orchestrator = orchestrator(
        Arc::new(StubSigner::ok()),
        Arc::new(StubUploader::rejecting(403)),
        processor.clone(),
    );

    let err = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .expect_err("upload rejected");
    assert!(matches!(err, VxError::Upload { status: 403 }));

    let job = orchestrator.snapshot();
    assert_eq!(job.status, SubmissionStatus::Error);
    assert_eq!(job.error_kind, Some(FailureKind::Upload));
    assert!(job.error.unwrap().contains("signature mismatch"));
    assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn submit_while_in_flight_is_rejected() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let signer = Arc::new(GatedSigner::default());
    let orchestrator = orchestrator(
        signer.clone(),
        Arc::new(StubUploader::reporting(&[100])),
        Arc::new(StubProcessor::ok()),
    );

    let running = {
        let orchestrator = orchestrator.clone();
        let clip = clip.clone();
        tokio::spawn(async move {
            orchestrator.submit(&clip, VxStyle::ClassicLonglens).await
        })
    };

    let mut jobs = orchestrator.subscribe();
    let in_flight = jobs
        .wait_for(|job| job.status == SubmissionStatus::Signing)
        .await
        .expect("job enters signing")
        .clone();

    let err = orchestrator
        .submit(&clip, VxStyle::RawMk1)
        .await
        .expect_err("second submit rejected");
    assert!(matches!(
        err,
        VxError::SubmissionInFlight {
            status: SubmissionStatus::Signing
        }
    ));
    assert_eq!(orchestrator.snapshot(), in_flight);

    signer.release.notify_one();
    let job = running.await.unwrap().expect("first job completes");
    assert_eq!(job.status, SubmissionStatus::Completed);
    assert_eq!(job.job_id, in_flight.job_id);
}

#[tokio::test(start_paused = true)]
async fn abandoned_submit_fails_the_job_and_allows_resubmit() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let signer = Arc::new(GatedSigner::default());
    let orchestrator = orchestrator(
        signer.clone(),
        Arc::new(StubUploader::reporting(&[100])),
        Arc::new(StubProcessor::ok()),
    );
    let mut events = orchestrator.events();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        orchestrator.submit(&clip, VxStyle::ClassicLonglens),
    )
    .await;
    assert!(timed_out.is_err(), "signing never completes");

    let abandoned = orchestrator.snapshot();
    assert_eq!(abandoned.status, SubmissionStatus::Error);
    assert_eq!(abandoned.error_kind, Some(FailureKind::Cancelled));
    assert!(matches!(
        drain(&mut events).last(),
        Some(SubmissionEvent::Failed { kind: FailureKind::Cancelled, .. })
    ));

    signer.release.notify_one();
    let job = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .expect("resubmit after an abandoned job");
    assert_eq!(job.status, SubmissionStatus::Completed);
    assert_ne!(job.job_id, abandoned.job_id);
    assert_eq!(job.error_kind, None);
}

#[tokio::test]
async fn dismiss_returns_to_idle_and_allows_resubmit() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let orchestrator = orchestrator(
        Arc::new(StubSigner::ok()),
        Arc::new(StubUploader::reporting(&[50, 100])),
        Arc::new(StubProcessor::ok()),
    );

    let first = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .unwrap();
    orchestrator.dismiss().expect("dismiss from completed");

    let idle = orchestrator.snapshot();
    assert_eq!(idle.status, SubmissionStatus::Idle);
    assert_eq!(idle.result, None);
    assert_eq!(idle.error, None);
    assert_eq!(idle.progress_percent, 0);

    let second = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .unwrap();
    assert_eq!(second.status, SubmissionStatus::Completed);
    assert_ne!(second.job_id, first.job_id);
}

#[tokio::test]
async fn dismiss_outside_completed_is_invalid() {
    let orchestrator = orchestrator(
        Arc::new(StubSigner::ok()),
        Arc::new(StubUploader::reporting(&[])),
        Arc::new(StubProcessor::ok()),
    );
    let err = orchestrator.dismiss().expect_err("nothing to dismiss");
    assert!(matches!(
        err,
        VxError::InvalidTransition {
            from: SubmissionStatus::Idle,
            to: SubmissionStatus::Idle
        }
    ));
}

#[tokio::test]
async fn resubmit_after_error_clears_previous_failure() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let attempts = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = attempts.clone();
    let orchestrator = orchestrator(
        Arc::new(StubSigner::ok()),
        Arc::new(StubUploader::reporting(&[100])),
        Arc::new(StubProcessor::with(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(VxError::Remote {
                    status: 502,
                    message: "Processing failed with status 502".into(),
                })
            } else {
                Ok(processing_result())
            }
        })),
    );

    orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .expect_err("first render fails");
    assert_eq!(orchestrator.status(), SubmissionStatus::Error);

    let job = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .expect("retry succeeds");
    assert_eq!(job.error, None);
    assert_eq!(job.error_kind, None);
    assert!(job.result.is_some());
}

#[tokio::test(start_paused = true)]
async fn stalled_upload_fails_when_watchdog_is_enabled() {
    let (_file, clip) = temp_clip(".mp4", b"frames");
    let processor = Arc::new(StubProcessor::ok());
    let orchestrator = orchestrator(
        Arc::new(StubSigner::ok()),
        Arc::new(StallingUploader),
        processor.clone(),
    )
    .with_stall_timeout(Some(Duration::from_secs(30)));

    let err = orchestrator
        .submit(&clip, VxStyle::ClassicLonglens)
        .await
        .expect_err("upload stalls");
    assert!(matches!(err, VxError::Stalled { .. }));

    let job = orchestrator.snapshot();
    assert_eq!(job.status, SubmissionStatus::Error);
    assert_eq!(job.error_kind, Some(FailureKind::Stalled));
    assert_eq!(job.progress_percent, 10);
    assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
}
