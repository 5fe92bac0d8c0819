//! Shapes returned by the generation service and the local download state
//! derived from them.

use serde::{Deserialize, Serialize};

/// Body of a successful `POST /upload`.
///
/// `language` and `singer` are display strings chosen by the service (e.g.
/// `"English"`), not the request codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongResult {
    /// Opaque job identifier used for polling.
    pub id: String,
    pub title: String,
    pub genre_tags: Vec<String>,
    #[serde(rename = "song_bpm")]
    pub tempo: i64,
    pub language: String,
    #[serde(rename = "singer")]
    pub voice_type: String,
    pub lyrics: String,
    /// Streamable preview of the song, available before the final file.
    #[serde(rename = "audio_url")]
    pub preview_audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Body of `GET /download?id=...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStatus {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Whether the final artifact can be downloaded yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadState {
    pub ready: bool,
    pub final_audio_url: Option<String>,
}

impl DownloadState {
    pub fn ready(url: impl Into<String>) -> Self {
        Self {
            ready: true,
            final_audio_url: Some(url.into()),
        }
    }
}

/// Result of a single status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The service has not finished the artifact yet.
    Pending,
    /// The artifact is ready at `audio_url`.
    Ready { audio_url: String },
    /// The check failed; polling must stop.
    Failed { reason: String },
}

impl PollOutcome {
    /// `Ready` and `Failed` end the poll loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Interpret a decoded status body.
    ///
    /// A `ready` response without an `audio_url` cannot be downloaded, so
    /// it is treated as a failure rather than retried forever.
    pub fn from_status(status: DownloadStatus) -> Self {
        match status {
            DownloadStatus { ready: false, .. } => Self::Pending,
            DownloadStatus {
                ready: true,
                audio_url: Some(audio_url),
            } => Self::Ready { audio_url },
            DownloadStatus {
                ready: true,
                audio_url: None,
            } => Self::Failed {
                reason: "Service reported ready without an audio_url".into(),
            },
        }
    }
}
