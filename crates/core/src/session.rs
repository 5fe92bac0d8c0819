//! Explicit form and result state for one user.
//!
//! [`Session`] replaces component-local mutable state: every change is a
//! method call with a defined transition, so a front end (or a test) can
//! drive the submit-then-poll workflow step by step.
//!
//! ```text
//! Editing --begin_submission--> Submitting --complete_submission--> Submitted
//!                                    |                                  |
//!                                    +--fail_submission--> Failed       +--apply_poll
//!                                    |
//!                                    +--abandon_submission--> Editing
//! ```

use crate::error::CoreError;
use crate::media::MediaList;
use crate::params::GenerationParameters;
use crate::result::{DownloadState, PollOutcome, SongResult};

/// Where the session is in the submit/poll workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Editing,
    Submitting,
    Submitted,
    Failed,
}

#[derive(Debug, Default)]
pub struct Session {
    pub media: MediaList,
    pub params: GenerationParameters,
    phase: Phase,
    result: Option<SongResult>,
    error: Option<String>,
    download: DownloadState,
    poll_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&SongResult> {
        self.result.as_ref()
    }

    /// User-visible message from the last failed submission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn download(&self) -> &DownloadState {
        &self.download
    }

    /// Reason polling stopped without producing an artifact, if it did.
    pub fn poll_error(&self) -> Option<&str> {
        self.poll_error.as_deref()
    }

    /// Submission is allowed with at least one media item and no request
    /// in flight.
    pub fn can_submit(&self) -> bool {
        !self.media.is_empty() && self.phase != Phase::Submitting
    }

    /// Start a submission attempt, clearing everything left over from the
    /// previous one.
    pub fn begin_submission(&mut self) -> Result<(), CoreError> {
        if self.phase == Phase::Submitting {
            return Err(CoreError::Conflict(
                "A generation request is already in flight".into(),
            ));
        }
        if self.media.is_empty() {
            return Err(CoreError::Validation(
                "Select at least one image or video before generating".into(),
            ));
        }

        self.result = None;
        self.error = None;
        self.download = DownloadState::default();
        self.poll_error = None;
        self.phase = Phase::Submitting;
        Ok(())
    }

    /// Record the service's response to the in-flight submission.
    pub fn complete_submission(&mut self, result: SongResult) -> Result<(), CoreError> {
        self.expect_submitting()?;
        self.result = Some(result);
        self.phase = Phase::Submitted;
        Ok(())
    }

    /// Record a failed submission. No result is kept.
    pub fn fail_submission(&mut self, message: impl Into<String>) -> Result<(), CoreError> {
        self.expect_submitting()?;
        self.error = Some(message.into());
        self.result = None;
        self.phase = Phase::Failed;
        Ok(())
    }

    /// Drop an in-flight submission that will never get a response, e.g.
    /// because the request future was cancelled. Returns the session to
    /// `Editing` so a new attempt can start. No-op in any other phase.
    pub fn abandon_submission(&mut self) -> bool {
        if self.phase != Phase::Submitting {
            return false;
        }
        self.result = None;
        self.phase = Phase::Editing;
        true
    }

    /// Apply one poll outcome for `job_id`. Returns `true` once polling of
    /// that job is finished.
    ///
    /// Outcomes for a job other than the one currently shown (e.g. from a
    /// cancelled poller after a new attempt began) are ignored.
    pub fn apply_poll(&mut self, job_id: &str, outcome: &PollOutcome) -> bool {
        let current = self.result.as_ref().map(|r| r.id.as_str());
        if self.phase != Phase::Submitted || current != Some(job_id) {
            return true;
        }
        match outcome {
            PollOutcome::Pending => false,
            PollOutcome::Ready { audio_url } => {
                self.download = DownloadState::ready(audio_url.clone());
                true
            }
            PollOutcome::Failed { reason } => {
                self.poll_error = Some(reason.clone());
                true
            }
        }
    }

    fn expect_submitting(&self) -> Result<(), CoreError> {
        if self.phase == Phase::Submitting {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "No submission in flight (phase: {:?})",
                self.phase
            )))
        }
    }
}
