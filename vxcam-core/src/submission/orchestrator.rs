//! The submission state machine.
//!
//! One orchestrator owns one job at a time. The job lives in a `watch`
//! channel so the in-flight check and the move to `Signing` happen in a
//! single `send_if_modified` call; events are broadcast from inside the
//! same critical section, which keeps them in the order the job changed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use vxcam_model::{
    Clip, JobId, ProcessingResult, SubmissionJob, SubmissionStatus,
    UploadTarget, VxStyle,
};

use super::events::SubmissionEvent;
use crate::api::{
    ApiClient, HttpProcessingClient, HttpSigningClient, HttpUploadTransport,
    ProcessingClient, ProgressFn, SigningClient, UploadTransport,
};
use crate::error::{Result, VxError};

const EVENT_CAPACITY: usize = 256;

/// Sequences sign, upload and process behind a single `submit`.
#[derive(Clone)]
pub struct SubmissionOrchestrator {
    signer: Arc<dyn SigningClient>,
    uploader: Arc<dyn UploadTransport>,
    processor: Arc<dyn ProcessingClient>,
    job: Arc<watch::Sender<SubmissionJob>>,
    events: broadcast::Sender<SubmissionEvent>,
    stall_timeout: Option<Duration>,
}

impl fmt::Debug for SubmissionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionOrchestrator")
            .field("job", &*self.job.borrow())
            .field("stall_timeout", &self.stall_timeout)
            .field("event_receivers", &self.events.receiver_count())
            .finish()
    }
}

impl SubmissionOrchestrator {
    pub fn new(
        signer: Arc<dyn SigningClient>,
        uploader: Arc<dyn UploadTransport>,
        processor: Arc<dyn ProcessingClient>,
    ) -> Self {
        let (job, _) = watch::channel(SubmissionJob::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            signer,
            uploader,
            processor,
            job: Arc::new(job),
            events,
            stall_timeout: None,
        }
    }

    /// Orchestrator backed by the HTTP clients, honouring the client's
    /// stall timeout.
    pub fn from_api(api: Arc<ApiClient>) -> Self {
        let stall_timeout = api.config().upload_stall_timeout;
        Self::new(
            Arc::new(HttpSigningClient::new(Arc::clone(&api))),
            Arc::new(HttpUploadTransport::new(Arc::clone(&api))),
            Arc::new(HttpProcessingClient::new(api)),
        )
        .with_stall_timeout(stall_timeout)
    }

    /// Fail uploads that report no progress for `timeout`.
    pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stall_timeout = timeout;
        self
    }

    pub fn snapshot(&self) -> SubmissionJob {
        self.job.borrow().clone()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.job.borrow().status
    }

    /// Latest job state; lagging receivers skip straight to the newest.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionJob> {
        self.job.subscribe()
    }

    /// Every change, in order.
    pub fn events(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    /// Run one job to a terminal state.
    ///
    /// Returns the completed job, or the error that moved it to `Error`.
    /// Rejected with [`VxError::SubmissionInFlight`] while another job is
    /// running; that job is left untouched. Dropping the future before it
    /// resolves moves the job to `Error` as [`VxError::Cancelled`].
    pub async fn submit(
        &self,
        clip: &Clip,
        style: VxStyle,
    ) -> Result<SubmissionJob> {
        let job_id = self.begin(clip)?;
        info!(%job_id, clip = %clip.name, %style, "submission started");
        let guard = AbandonGuard {
            orchestrator: self,
            job_id,
            armed: true,
        };

        let outcome = match self.run(job_id, clip, style).await {
            Ok(result) => self
                .complete(job_id, result)
                .map(|()| self.snapshot()),
            Err(err) => Err(err),
        };
        guard.disarm();

        outcome.inspect_err(|err| self.fail(job_id, err))
    }

    /// Return a completed job to `Idle`, clearing its result.
    pub fn dismiss(&self) -> Result<()> {
        let mut from = SubmissionStatus::Idle;
        let events = &self.events;
        let dismissed = self.job.send_if_modified(|job| {
            from = job.status;
            if !job.status.can_transition_to(SubmissionStatus::Idle) {
                return false;
            }
            if let Some(job_id) = job.job_id {
                let _ = events.send(SubmissionEvent::StatusChanged {
                    job_id,
                    status: SubmissionStatus::Idle,
                });
            }
            *job = SubmissionJob::default();
            true
        });

        if dismissed {
            debug!("submission dismissed");
            Ok(())
        } else {
            Err(VxError::InvalidTransition {
                from,
                to: SubmissionStatus::Idle,
            })
        }
    }

    fn begin(&self, clip: &Clip) -> Result<JobId> {
        let job_id = JobId::new();
        let mut busy = None;
        let events = &self.events;
        self.job.send_if_modified(|job| {
            if !job.status.accepts_submit() {
                busy = Some(job.status);
                return false;
            }
            *job = SubmissionJob::signing(job_id, clip.id);
            let _ = events.send(SubmissionEvent::StatusChanged {
                job_id,
                status: SubmissionStatus::Signing,
            });
            true
        });

        match busy {
            Some(status) => {
                warn!(%status, "submit rejected, job in flight");
                Err(VxError::SubmissionInFlight { status })
            }
            None => Ok(job_id),
        }
    }

    async fn run(
        &self,
        job_id: JobId,
        clip: &Clip,
        style: VxStyle,
    ) -> Result<ProcessingResult> {
        let target = self.signer.sign(&clip.name, &clip.content_type).await?;

        self.advance(job_id, SubmissionStatus::Uploading)?;
        self.upload(job_id, &target, clip).await?;

        self.advance(job_id, SubmissionStatus::Processing)?;
        self.processor.process(&target.storage_uri, style).await
    }

    async fn upload(
        &self,
        job_id: JobId,
        target: &UploadTarget,
        clip: &Clip,
    ) -> Result<()> {
        let (heartbeat, mut beats) = watch::channel(0_u64);
        let job = Arc::clone(&self.job);
        let events = self.events.clone();

        let on_progress: ProgressFn = Arc::new(move |percent: u8| {
            heartbeat.send_modify(|count| *count += 1);
            let percent = percent.min(100);
            job.send_if_modified(|current| {
                let applies = current.job_id == Some(job_id)
                    && current.status == SubmissionStatus::Uploading
                    && current.progress_percent != percent;
                if applies {
                    current.progress_percent = percent;
                    let _ = events
                        .send(SubmissionEvent::Progress { job_id, percent });
                }
                applies
            });
        });

        let upload = self.uploader.upload(target, clip, on_progress);
        let Some(limit) = self.stall_timeout else {
            return upload.await;
        };

        tokio::pin!(upload);
        loop {
            tokio::select! {
                biased;
                outcome = &mut upload => return outcome,
                beat = tokio::time::timeout(limit, beats.changed()) => match beat {
                    Ok(Ok(())) => continue,
                    // The transport let go of the callback; nothing left
                    // to watch.
                    Ok(Err(_)) => return upload.await,
                    Err(_) => {
                        warn!(%job_id, after = ?limit, "upload stalled");
                        return Err(VxError::Stalled { after: limit });
                    }
                },
            }
        }
    }

    fn advance(&self, job_id: JobId, next: SubmissionStatus) -> Result<()> {
        self.apply(job_id, next, |_| {}, |_| None)
    }

    fn complete(&self, job_id: JobId, result: ProcessingResult) -> Result<()> {
        let event = SubmissionEvent::Completed {
            job_id,
            result: result.clone(),
        };
        self.apply(
            job_id,
            SubmissionStatus::Completed,
            move |job| job.result = Some(result),
            move |_| Some(event),
        )?;
        info!(%job_id, "submission completed");
        Ok(())
    }

    fn fail(&self, job_id: JobId, err: &VxError) {
        let message = err.user_message();
        let kind = err.failure_kind();
        warn!(%job_id, ?kind, error = %err, "submission failed");

        let outcome = self.apply(
            job_id,
            SubmissionStatus::Error,
            |job| {
                job.error = Some(message.clone());
                job.error_kind = Some(kind);
            },
            |_| {
                Some(SubmissionEvent::Failed {
                    job_id,
                    kind,
                    message: message.clone(),
                })
            },
        );
        if let Err(err) = outcome {
            warn!(%job_id, error = %err, "could not record failure");
        }
    }

    /// Move the job to `next`, mutate it, and publish `StatusChanged`
    /// followed by any extra event, all under the channel lock.
    fn apply(
        &self,
        job_id: JobId,
        next: SubmissionStatus,
        mutate: impl FnOnce(&mut SubmissionJob),
        extra: impl FnOnce(&SubmissionJob) -> Option<SubmissionEvent>,
    ) -> Result<()> {
        let mut from = SubmissionStatus::Idle;
        let events = &self.events;
        let applied = self.job.send_if_modified(|job| {
            from = job.status;
            if job.job_id != Some(job_id) || !job.status.can_transition_to(next)
            {
                return false;
            }
            job.status = next;
            mutate(job);
            let _ = events.send(SubmissionEvent::StatusChanged {
                job_id,
                status: next,
            });
            if let Some(event) = extra(job) {
                let _ = events.send(event);
            }
            true
        });

        if applied {
            debug!(%job_id, %from, to = %next, "job transition");
            Ok(())
        } else {
            Err(VxError::InvalidTransition { from, to: next })
        }
    }
}

/// Moves the job to `Error` if the `submit` future is dropped mid-flight.
struct AbandonGuard<'a> {
    orchestrator: &'a SubmissionOrchestrator,
    job_id: JobId,
    armed: bool,
}

impl AbandonGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.orchestrator.fail(self.job_id, &VxError::Cancelled);
        }
    }
}
