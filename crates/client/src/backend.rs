//! The seam between the submit/poll workflow and the remote service.

use async_trait::async_trait;
use lifemix_core::media::MediaItem;
use lifemix_core::params::UploadMetadata;
use lifemix_core::result::{DownloadStatus, SongResult};

use crate::api::{SongGenApi, SongGenApiError};

/// Remote operations the workflow needs from a generation service.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Submit media and parameters; returns the new job's result.
    async fn upload(
        &self,
        media: &[MediaItem],
        metadata: &UploadMetadata,
    ) -> Result<SongResult, SongGenApiError>;

    /// Check the download status of a job.
    async fn download_status(&self, job_id: &str) -> Result<DownloadStatus, SongGenApiError>;
}

#[async_trait]
impl JobBackend for SongGenApi {
    async fn upload(
        &self,
        media: &[MediaItem],
        metadata: &UploadMetadata,
    ) -> Result<SongResult, SongGenApiError> {
        SongGenApi::upload(self, media, metadata).await
    }

    async fn download_status(&self, job_id: &str) -> Result<DownloadStatus, SongGenApiError> {
        SongGenApi::download_status(self, job_id).await
    }
}
