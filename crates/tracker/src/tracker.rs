//! Upload-and-poll job tracker.
//!
//! [`JobTracker`] drives one dubbing job at a time through
//! validation -> upload -> status polling -> a terminal state, and reports
//! every step as a [`TrackerEvent`] on a [`tokio::sync::broadcast`]
//! channel. Call [`JobTracker::subscribe`] to receive them.
//!
//! All job state lives in one [`TrackerState`] behind a mutex and is only
//! touched in short critical sections after each network call completes.
//! At most one poll task exists per tracker: starting a new cycle cancels
//! the previous task first, and every cycle carries a generation number
//! so a response that arrives for a superseded cycle is dropped.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vdub_core::job_status::JobStatus;
use vdub_core::notice::{
    still_trying_message, Severity, MSG_JOB_COMPLETED, MSG_JOB_FAILED, MSG_UPLOADING,
    MSG_UPLOAD_FAILED,
};
use vdub_core::progress::{upload_percent, UPLOAD_PHASE_PERCENT};
use vdub_core::types::JobId;
use vdub_core::upload::{self, UploadRequest, ValidRequest};

use crate::api::{DubbingApiError, UploadProgress};
use crate::error::TrackerError;
use crate::events::TrackerEvent;
use crate::messages::StatusReport;
use crate::poll::{AttemptDecision, PollConfig, PollState};
use crate::service::JobService;

/// Broadcast channel capacity for tracker events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long [`JobTracker::shutdown`] waits for the poll task to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Progress message once the server has accepted the upload.
const MSG_UPLOADED: &str = "Video uploaded. Waiting for processing to start...";

/// Progress message when the server completes without one.
const MSG_PROCESSING_DONE: &str = "Processing completed";

/// Reason given to an upload overtaken by a newer submission.
const MSG_SUPERSEDED: &str = "Superseded by a newer upload";

/// Reason given to work requested after [`JobTracker::shutdown`].
const MSG_SHUT_DOWN: &str = "Job tracker has been shut down";

/// Where the tracker is in a job's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Uploading,
    Polling,
    Completed,
    Failed,
}

/// Point-in-time copy of the tracker state, for adapters that render on
/// demand rather than from events.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub phase: Phase,
    pub job_id: Option<JobId>,
    pub progress: u8,
    pub message: String,
    /// Status checks spent on the current job.
    pub attempts: u32,
    /// Set once the job completed.
    pub download_url: Option<String>,
}

/// Result of a single [`JobTracker::check_status`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The job is still running.
    Pending,
    /// The check failed at the transport layer; polling continues.
    Retrying(TrackerError),
    Completed,
    /// Terminal failure: server-reported error or timeout.
    Failed(TrackerError),
    /// The job is not being polled (stale ID or already terminal).
    Ignored,
}

impl PollOutcome {
    pub fn keeps_polling(&self) -> bool {
        matches!(self, Self::Pending | Self::Retrying(_))
    }
}

/// Why a new poll cycle was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleRefused {
    Superseded,
    ShutDown,
}

#[derive(Debug)]
struct TrackerState {
    phase: Phase,
    job_id: Option<JobId>,
    progress: u8,
    message: String,
    poll: PollState,
    download_url: Option<String>,
    /// Bumped on every submission.
    submission: u64,
    /// Bumped whenever a poll cycle starts or stops.
    cycle: u64,
}

impl TrackerState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            job_id: None,
            progress: 0,
            message: String::new(),
            poll: PollState::default(),
            download_url: None,
            submission: 0,
            cycle: 0,
        }
    }

    fn is_polling(&self, job_id: &JobId) -> bool {
        self.phase == Phase::Polling && self.job_id.as_ref() == Some(job_id)
    }
}

/// Handle to the running poll task.
struct PollTask {
    job_id: JobId,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl PollTask {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Tracks one dubbing job per submission.
///
/// Created once per session via [`JobTracker::new`]. The returned `Arc`
/// can be cloned into whatever drives the UI.
pub struct JobTracker<S> {
    service: S,
    config: PollConfig,
    state: Mutex<TrackerState>,
    poll_task: Mutex<Option<PollTask>>,
    event_tx: broadcast::Sender<TrackerEvent>,
    /// Mirrors `TrackerState::submission` for the synchronous upload
    /// progress sink.
    current_submission: Arc<AtomicU64>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
}

impl<S: JobService + 'static> JobTracker<S> {
    pub fn new(service: S, config: PollConfig) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            service,
            config,
            state: Mutex::new(TrackerState::new()),
            poll_task: Mutex::new(None),
            event_tx,
            current_submission: Arc::new(AtomicU64::new(0)),
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to tracker events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.event_tx.subscribe()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        let state = self.state.lock().await;
        TrackerSnapshot {
            phase: state.phase,
            job_id: state.job_id.clone(),
            progress: state.progress,
            message: state.message.clone(),
            attempts: state.poll.attempts(),
            download_url: state.download_url.clone(),
        }
    }

    /// Whether a poll task is currently alive.
    pub async fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.cancel.is_cancelled() && !task.handle.is_finished())
    }

    /// Validate an upload request. Failures are reported as a warning
    /// notice; nothing is sent.
    pub fn validate(&self, request: UploadRequest) -> Result<ValidRequest, TrackerError> {
        upload::validate(request).map_err(|e| {
            tracing::warn!(error = %e, "Upload request rejected");
            self.notify(Severity::Warning, e.to_string());
            TrackerError::from(e)
        })
    }

    /// Validate and upload a video, then start polling the new job.
    ///
    /// Any poll cycle from an earlier submission is cancelled before the
    /// upload begins.
    pub async fn submit(self: &Arc<Self>, request: UploadRequest) -> Result<JobId, TrackerError> {
        let valid = self.validate(request)?;

        if self.cancel.is_cancelled() {
            tracing::warn!("Upload refused, tracker is shut down");
            let error = TrackerError::Submission(MSG_SHUT_DOWN.to_string());
            let mut state = self.state.lock().await;
            self.abandon_submission_locked(&mut state, None, &error);
            return Err(error);
        }

        self.stop_polling().await;

        let submission = {
            let mut state = self.state.lock().await;
            state.submission += 1;
            self.current_submission.store(state.submission, Ordering::Release);
            state.phase = Phase::Uploading;
            state.job_id = None;
            state.progress = 0;
            state.message = MSG_UPLOADING.to_string();
            state.poll = PollState::default();
            state.download_url = None;
            state.submission
        };
        self.emit(TrackerEvent::Progress {
            job_id: None,
            percent: 0,
            message: MSG_UPLOADING.to_string(),
        });

        tracing::info!(
            file = %valid.file().name,
            bytes = valid.file().size(),
            target_language = %valid.target_language(),
            "Uploading video",
        );

        let result = self
            .service
            .upload(valid, self.upload_progress_sink(submission))
            .await;

        let mut state = self.state.lock().await;
        if state.submission != submission {
            tracing::debug!("Upload finished after a newer submission, discarding");
            return Err(TrackerError::Submission(MSG_SUPERSEDED.to_string()));
        }

        match result {
            Ok(job_id) => {
                tracing::info!(job_id = %job_id, "Upload accepted");
                state.job_id = Some(job_id.clone());
                state.progress = UPLOAD_PHASE_PERCENT;
                state.message = MSG_UPLOADED.to_string();
                drop(state);

                self.emit(TrackerEvent::Progress {
                    job_id: Some(job_id.clone()),
                    percent: UPLOAD_PHASE_PERCENT,
                    message: MSG_UPLOADED.to_string(),
                });
                match self.begin_poll_cycle(job_id.clone(), Some(submission)).await {
                    Ok(()) => Ok(job_id),
                    Err(CycleRefused::Superseded) => {
                        Err(TrackerError::Submission(MSG_SUPERSEDED.to_string()))
                    }
                    Err(CycleRefused::ShutDown) => {
                        let error = TrackerError::Submission(MSG_SHUT_DOWN.to_string());
                        let mut state = self.state.lock().await;
                        if state.submission == submission {
                            self.abandon_submission_locked(&mut state, Some(job_id), &error);
                        }
                        Err(error)
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Upload failed");
                let error = TrackerError::Submission(submission_message(&e));
                self.abandon_submission_locked(&mut state, None, &error);
                Err(error)
            }
        }
    }

    /// Start polling `job_id`, replacing any running poll cycle. Does
    /// nothing once the tracker has been shut down.
    pub async fn start_polling(self: &Arc<Self>, job_id: JobId) {
        let _ = self.begin_poll_cycle(job_id, None).await;
    }

    /// Issue one status check for `job_id` and apply the result.
    ///
    /// A no-op returning [`PollOutcome::Ignored`] unless the tracker is
    /// currently polling exactly this job.
    pub async fn check_status(&self, job_id: &JobId) -> PollOutcome {
        let (cycle, attempt) = {
            let mut state = self.state.lock().await;
            if !state.is_polling(job_id) {
                tracing::debug!(job_id = %job_id, phase = ?state.phase, "Ignoring status check for inactive job");
                return PollOutcome::Ignored;
            }
            match state.poll.begin_attempt(&self.config) {
                AttemptDecision::Proceed(attempt) => (state.cycle, attempt),
                AttemptDecision::Exhausted => {
                    let error = TrackerError::Timeout {
                        attempts: self.config.max_attempts,
                    };
                    tracing::error!(
                        job_id = %job_id,
                        attempts = self.config.max_attempts,
                        "Job timed out waiting for a final status",
                    );
                    self.fail_locked(&mut state, error.clone());
                    return PollOutcome::Failed(error);
                }
            }
        };

        let result = self.service.job_status(job_id).await;

        let mut state = self.state.lock().await;
        if state.cycle != cycle || !state.is_polling(job_id) {
            tracing::debug!(job_id = %job_id, attempt, "Dropping status for superseded poll cycle");
            return PollOutcome::Ignored;
        }

        match result {
            Ok(report) => self.apply_report_locked(&mut state, job_id, attempt, report),
            Err(e) => {
                tracing::warn!(job_id = %job_id, attempt, error = %e, "Status check failed, will retry");
                if state.poll.record_failure(&self.config) {
                    self.notify(
                        Severity::Info,
                        still_trying_message(state.poll.consecutive_failures()),
                    );
                }
                PollOutcome::Retrying(TrackerError::TransientPoll(e.to_string()))
            }
        }
    }

    /// Cancel the running poll cycle, if any. A job that was being polled
    /// returns to [`Phase::Idle`].
    pub async fn stop_polling(&self) {
        let previous = self.poll_task.lock().await.take();

        {
            let mut state = self.state.lock().await;
            state.cycle += 1;
            if state.phase == Phase::Polling {
                state.phase = Phase::Idle;
            }
        }

        if let Some(task) = previous {
            tracing::info!(job_id = %task.job_id, "Stopping status polling");
            task.stop();
        }
    }

    /// Tear the tracker down. Cancels the master token, then waits up to
    /// 5 seconds for the poll task to exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down job tracker");
        self.cancel.cancel();

        let previous = self.poll_task.lock().await.take();
        if let Some(task) = previous {
            task.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_GRACE, task.handle).await.is_err() {
                tracing::warn!(job_id = %task.job_id, "Poll task did not exit in time");
            }
        }

        let mut state = self.state.lock().await;
        state.cycle += 1;
        if state.phase == Phase::Polling {
            state.phase = Phase::Idle;
        }
    }

    // ---- private helpers ----

    /// Replace the current poll cycle with a fresh one for `job_id`.
    ///
    /// When `submission` is given the cycle only starts if no newer
    /// submission has begun in the meantime. A refused cycle leaves the
    /// running one untouched.
    async fn begin_poll_cycle(
        self: &Arc<Self>,
        job_id: JobId,
        submission: Option<u64>,
    ) -> Result<(), CycleRefused> {
        let mut slot = self.poll_task.lock().await;

        {
            let mut state = self.state.lock().await;
            if submission.is_some_and(|s| s != state.submission) {
                tracing::debug!(job_id = %job_id, "Not polling, a newer submission owns the tracker");
                return Err(CycleRefused::Superseded);
            }
            if self.cancel.is_cancelled() {
                tracing::warn!(job_id = %job_id, "Not polling, tracker is shut down");
                return Err(CycleRefused::ShutDown);
            }

            if let Some(previous) = slot.take() {
                tracing::debug!(job_id = %previous.job_id, "Cancelling previous poll cycle");
                previous.stop();
            }

            state.cycle += 1;
            state.phase = Phase::Polling;
            state.job_id = Some(job_id.clone());
            state.poll = PollState::default();
            state.download_url = None;
        }

        let cancel = self.cancel.child_token();
        let tracker = Arc::clone(self);
        let task_job_id = job_id.clone();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(job_id = %task_job_id, "Starting status polling");
            run_poll_loop(&tracker, &task_job_id, &task_cancel).await;
            tracing::info!(job_id = %task_job_id, "Status polling exited");
        });

        *slot = Some(PollTask {
            job_id,
            cancel,
            handle,
        });
        Ok(())
    }

    fn apply_report_locked(
        &self,
        state: &mut TrackerState,
        job_id: &JobId,
        attempt: u32,
        report: StatusReport,
    ) -> PollOutcome {
        state.poll.record_success();
        tracing::debug!(
            job_id = %job_id,
            attempt,
            stage = %report.stage,
            progress = report.progress,
            "Job status",
        );

        match report.status {
            JobStatus::Completed => {
                let download_url = self.service.download_url(job_id);
                let message = if report.message.is_empty() {
                    MSG_PROCESSING_DONE.to_string()
                } else {
                    report.message
                };

                state.phase = Phase::Completed;
                state.progress = 100;
                state.message = message.clone();
                state.download_url = Some(download_url.clone());

                tracing::info!(job_id = %job_id, attempt, "Job completed");
                self.emit(TrackerEvent::Progress {
                    job_id: Some(job_id.clone()),
                    percent: 100,
                    message,
                });
                self.notify(Severity::Success, MSG_JOB_COMPLETED.to_string());
                self.emit(TrackerEvent::Completed {
                    job_id: job_id.clone(),
                    download_url,
                });
                PollOutcome::Completed
            }
            JobStatus::Error => {
                let reason = if report.message.is_empty() {
                    MSG_JOB_FAILED.to_string()
                } else {
                    report.message
                };
                state.progress = report.progress;
                tracing::error!(job_id = %job_id, attempt, reason = %reason, "Job failed on server");

                let error = TrackerError::Job(reason);
                self.fail_locked(state, error.clone());
                PollOutcome::Failed(error)
            }
            JobStatus::Processing => {
                state.progress = report.progress;
                state.message = report.message.clone();
                self.emit(TrackerEvent::Progress {
                    job_id: Some(job_id.clone()),
                    percent: report.progress,
                    message: report.message,
                });
                PollOutcome::Pending
            }
        }
    }

    fn fail_locked(&self, state: &mut TrackerState, error: TrackerError) {
        state.phase = Phase::Failed;
        state.message = error.to_string();
        state.download_url = None;

        self.notify(Severity::Danger, error.to_string());
        self.emit(TrackerEvent::Failed {
            job_id: state.job_id.clone(),
            error,
        });
        self.emit(TrackerEvent::Reset);
    }

    /// Return to idle after a submission that left nothing to poll.
    fn abandon_submission_locked(
        &self,
        state: &mut TrackerState,
        job_id: Option<JobId>,
        error: &TrackerError,
    ) {
        state.phase = Phase::Idle;
        state.job_id = None;
        state.progress = 0;
        state.message.clear();
        state.download_url = None;

        self.notify(Severity::Danger, error.to_string());
        self.emit(TrackerEvent::Failed {
            job_id,
            error: error.clone(),
        });
        self.emit(TrackerEvent::Reset);
    }

    /// Progress callback for the upload, reporting each whole percent of
    /// the upload band once. Goes quiet once a newer submission starts.
    fn upload_progress_sink(&self, submission: u64) -> UploadProgress {
        let event_tx = self.event_tx.clone();
        let current = Arc::clone(&self.current_submission);
        let last_percent = AtomicU8::new(0);
        Arc::new(move |sent, total| {
            if current.load(Ordering::Acquire) != submission {
                return;
            }
            let percent = upload_percent(sent, total);
            if last_percent.swap(percent, Ordering::Relaxed) != percent {
                let _ = event_tx.send(TrackerEvent::Progress {
                    job_id: None,
                    percent,
                    message: MSG_UPLOADING.to_string(),
                });
            }
        })
    }

    fn notify(&self, severity: Severity, message: String) {
        self.emit(TrackerEvent::Notice { severity, message });
    }

    fn emit(&self, event: TrackerEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Tick every `interval` and check status until the job leaves the
/// polling phase or `cancel` fires.
async fn run_poll_loop<S: JobService + 'static>(
    tracker: &JobTracker<S>,
    job_id: &JobId,
    cancel: &CancellationToken,
) {
    let interval = tracker.config.interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = tracker.check_status(job_id) => outcome,
        };

        if !outcome.keeps_polling() {
            return;
        }
    }
}

/// User-facing reason for a failed upload. Server rejections carry their
/// own message; transport failures get the generic one.
fn submission_message(error: &DubbingApiError) -> String {
    match error {
        DubbingApiError::Rejected(message) => message.clone(),
        _ => MSG_UPLOAD_FAILED.to_string(),
    }
}
