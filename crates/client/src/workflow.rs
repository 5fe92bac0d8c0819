//! Submission workflow: one generation attempt from form state to a
//! running download poller.
//!
//! [`JobClient`] takes the caller's [`Session`] explicitly, applies the
//! submission transitions to it, and hands back a [`Submission`] whose
//! [`PollHandle`] owns the background poll task. Poll outcomes arrive as
//! [`JobEvent`]s; the caller feeds them to [`Session::apply_poll`].

use std::sync::Arc;

use lifemix_core::error::CoreError;
use lifemix_core::params::UploadMetadata;
use lifemix_core::result::SongResult;
use lifemix_core::session::Session;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::api::SongGenApiError;
use crate::backend::JobBackend;
use crate::events::JobEvent;
use crate::poller::{spawn_poller, PollConfig, PollHandle};

/// Broadcast channel capacity for job events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Outcome of a successful [`JobClient::submit`].
#[derive(Debug)]
pub struct Submission {
    pub result: SongResult,
    /// Owns the poll task; dropping it stops polling.
    pub poll: PollHandle,
}

/// Drives submissions against one generation service.
pub struct JobClient {
    backend: Arc<dyn JobBackend>,
    poll_config: PollConfig,
    event_tx: broadcast::Sender<JobEvent>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
    /// Token of the most recently started poller.
    active_poll: Mutex<Option<CancellationToken>>,
}

impl JobClient {
    pub fn new(backend: Arc<dyn JobBackend>, poll_config: PollConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            poll_config,
            event_tx,
            cancel: CancellationToken::new(),
            active_poll: Mutex::new(None),
        }
    }

    /// Subscribe to job events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    /// Submit the session's media and parameters and start polling.
    ///
    /// Any poller from a previous submission is cancelled first. On
    /// transport failure the session records a user-visible message and
    /// the error is returned; no poller is started. Fails with
    /// [`CoreError::Conflict`] once the client has been shut down.
    pub async fn submit(&self, session: &mut Session) -> Result<Submission, JobClientError> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Conflict("Job client is shut down".into()).into());
        }

        session.begin_submission()?;
        let mut in_flight = InFlight::arm(session);
        self.cancel_active().await;

        let metadata = UploadMetadata::from(&in_flight.session.params);
        tracing::info!(
            media_count = in_flight.session.media.len(),
            bpm = metadata.bpm,
            tags = ?metadata.tags,
            language = %metadata.language,
            singer = %metadata.singer,
            "Submitting generation request",
        );

        let upload = self
            .backend
            .upload(in_flight.session.media.items(), &metadata)
            .await;
        in_flight.armed = false;
        let session = &mut *in_flight.session;

        let result = match upload {
            Ok(result) => result,
            Err(e) => {
                let err = JobClientError::Transport(e);
                tracing::error!(error = %err, "Generation request failed");
                session.fail_submission(err.user_message())?;
                return Err(err);
            }
        };

        session.complete_submission(result.clone())?;
        tracing::info!(job_id = %result.id, title = %result.title, "Generation request accepted");

        let _ = self.event_tx.send(JobEvent::Submitted {
            job_id: result.id.clone(),
            title: result.title.clone(),
        });

        let poll = spawn_poller(
            Arc::clone(&self.backend),
            result.id.clone(),
            &self.poll_config,
            self.event_tx.clone(),
            &self.cancel,
        );
        *self.active_poll.lock().await = Some(poll.cancel_token());

        Ok(Submission { result, poll })
    }

    /// Cancel every poller and refuse further submissions.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down job client");
        self.cancel.cancel();
        self.active_poll.lock().await.take();
    }

    async fn cancel_active(&self) {
        if let Some(previous) = self.active_poll.lock().await.take() {
            if !previous.is_cancelled() {
                tracing::info!("Cancelling poller of the previous submission");
                previous.cancel();
            }
        }
    }
}

/// Holds a session in `Submitting` while its upload is awaited. If the
/// `submit` future is dropped before the upload resolves, the submission is
/// abandoned so the session does not stay in flight forever.
struct InFlight<'a> {
    session: &'a mut Session,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn arm(session: &'a mut Session) -> Self {
        Self {
            session,
            armed: true,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed && self.session.abandon_submission() {
            tracing::warn!("Generation request dropped before a response; submission abandoned");
        }
    }
}

/// Errors returned by [`JobClient::submit`].
#[derive(Debug, thiserror::Error)]
pub enum JobClientError {
    /// The session rejected the submission (no media, already in flight).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The upload failed on the network or with a non-2xx status.
    #[error(transparent)]
    Transport(#[from] SongGenApiError),
}

impl JobClientError {
    /// The single message shown to the user in the error alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(SongGenApiError::ApiError { status, .. }) => {
                format!("HTTP error! status: {status}")
            }
            other => other.to_string(),
        }
    }
}
