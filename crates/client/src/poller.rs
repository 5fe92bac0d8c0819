//! Fixed-interval download-status polling.
//!
//! After a successful upload, [`spawn_poller`] starts a background task that
//! calls [`poll_once`] every [`PollConfig::interval`] until the service
//! reports the artifact ready or a check fails. There is no backoff, jitter
//! or attempt cap.
//!
//! The task is owned by the returned [`PollHandle`]: calling
//! [`PollHandle::cancel`] or dropping the handle stops it.

use std::sync::Arc;
use std::time::Duration;

use lifemix_core::result::PollOutcome;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::JobBackend;
use crate::events::JobEvent;

/// Interval between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Tunable parameters for the poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the first check and between subsequent checks.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// How a poll task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTermination {
    Ready { audio_url: String },
    Failed { reason: String },
    Cancelled,
}

/// Perform a single status check for `job_id`.
///
/// Transport and parse errors are logged and mapped to
/// [`PollOutcome::Failed`]; they are never returned as `Err`.
pub async fn poll_once(backend: &dyn JobBackend, job_id: &str) -> PollOutcome {
    match backend.download_status(job_id).await {
        Ok(status) => {
            let outcome = PollOutcome::from_status(status);
            match &outcome {
                PollOutcome::Pending => tracing::debug!(job_id, "Audio not ready yet"),
                PollOutcome::Ready { audio_url } => {
                    tracing::info!(job_id, audio_url = %audio_url, "Audio ready for download")
                }
                PollOutcome::Failed { reason } => {
                    tracing::error!(job_id, reason = %reason, "Unusable download status")
                }
            }
            outcome
        }
        Err(e) => {
            tracing::error!(job_id, error = %e, "Error polling download status");
            PollOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Owner of a running poll task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct PollHandle {
    job_id: String,
    cancel: CancellationToken,
    task: Option<JoinHandle<PollTermination>>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop polling. Idempotent; has no effect once the task has ended.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this poll task when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task to end and report why it ended.
    pub async fn wait(mut self) -> PollTermination {
        let Some(task) = self.task.take() else {
            return PollTermination::Cancelled;
        };

        match task.await {
            Ok(termination) => termination,
            Err(e) => {
                tracing::error!(job_id = %self.job_id, error = %e, "Poll task aborted");
                PollTermination::Failed {
                    reason: format!("Poll task aborted: {e}"),
                }
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the poll loop for `job_id`.
///
/// The loop's token is a child of `parent`, so cancelling `parent` also
/// stops it. Every check is published as [`JobEvent::Polled`].
pub fn spawn_poller(
    backend: Arc<dyn JobBackend>,
    job_id: String,
    config: &PollConfig,
    event_tx: broadcast::Sender<JobEvent>,
    parent: &CancellationToken,
) -> PollHandle {
    let cancel = parent.child_token();
    let cancel_clone = cancel.clone();
    let interval = config.interval;
    let job_id_clone = job_id.clone();

    let task = tokio::spawn(async move {
        tracing::info!(job_id = %job_id_clone, interval_ms = interval.as_millis() as u64, "Starting download poller");
        let termination =
            run_poll_loop(backend.as_ref(), &job_id_clone, interval, &event_tx, &cancel_clone)
                .await;
        tracing::info!(job_id = %job_id_clone, ?termination, "Download poller exited");
        termination
    });

    PollHandle {
        job_id,
        cancel,
        task: Some(task),
    }
}

/// Core poll loop: wait for the tick -> check -> stop on a terminal outcome.
///
/// Each check is awaited before the next tick is taken, so checks for one
/// job never overlap. A check slower than the interval delays the next one
/// rather than bunching ticks up.
async fn run_poll_loop(
    backend: &dyn JobBackend,
    job_id: &str,
    interval: Duration,
    event_tx: &broadcast::Sender<JobEvent>,
    cancel: &CancellationToken,
) -> PollTermination {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempt = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(job_id, event_tx),
            _ = ticker.tick() => {}
        }

        attempt += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(job_id, event_tx),
            outcome = poll_once(backend, job_id) => outcome,
        };

        let _ = event_tx.send(JobEvent::Polled {
            job_id: job_id.to_string(),
            attempt,
            outcome: outcome.clone(),
        });

        match outcome {
            PollOutcome::Pending => {}
            PollOutcome::Ready { audio_url } => return PollTermination::Ready { audio_url },
            PollOutcome::Failed { reason } => return PollTermination::Failed { reason },
        }
    }
}

fn cancelled(job_id: &str, event_tx: &broadcast::Sender<JobEvent>) -> PollTermination {
    tracing::info!(job_id, "Download polling cancelled");
    let _ = event_tx.send(JobEvent::PollCancelled {
        job_id: job_id.to_string(),
    });
    PollTermination::Cancelled
}
