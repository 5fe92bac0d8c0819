//! Events emitted while a generation job is submitted and polled.
//!
//! Published on the [`JobClient`](crate::workflow::JobClient) broadcast
//! channel. Call [`JobClient::subscribe`](crate::workflow::JobClient::subscribe)
//! to receive them.

use lifemix_core::result::PollOutcome;
use serde::Serialize;

/// A workflow-level event for one job.
#[derive(Debug, Clone, Serialize)]
pub enum JobEvent {
    /// The service accepted the upload and assigned a job id.
    Submitted { job_id: String, title: String },

    /// One status check finished.
    Polled {
        job_id: String,
        /// 1-based count of checks made for this job.
        attempt: u32,
        outcome: PollOutcome,
    },

    /// Polling stopped before a terminal outcome.
    PollCancelled { job_id: String },
}

impl JobEvent {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Submitted { job_id, .. }
            | Self::Polled { job_id, .. }
            | Self::PollCancelled { job_id } => job_id,
        }
    }
}
