//! REST API client for the song-generation service.
//!
//! Wraps the service's HTTP API (multipart upload, download status,
//! health check, artifact fetch) using [`reqwest`].

use std::time::Duration;

use lifemix_core::media::MediaItem;
use lifemix_core::params::UploadMetadata;
use lifemix_core::result::{DownloadStatus, SongResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Multipart field carrying each media file.
pub const FIELD_IMAGES: &str = "images";
/// Multipart field carrying the JSON parameters.
pub const FIELD_METADATA: &str = "metadata";

const USER_AGENT: &str = concat!("lifemix/", env!("CARGO_PKG_VERSION"));

/// HTTP client for a single generation service.
pub struct SongGenApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by `GET /health`.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Errors from the generation service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum SongGenApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Generation service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The request body could not be assembled.
    #[error("Invalid request payload: {0}")]
    Payload(String),
}

impl SongGenApi {
    /// Create a new API client with no request timeout.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:5000`. A trailing
    ///   slash is ignored.
    pub fn new(api_url: impl Into<String>) -> Result<Self, SongGenApiError> {
        let client = Self::client_builder().build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create an API client with a per-request timeout.
    ///
    /// Uploads wait for lyric and audio generation on the service side, so
    /// the timeout should be generous.
    pub fn with_timeout(
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SongGenApiError> {
        let client = Self::client_builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Base HTTP URL of the service.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit media and parameters for generation.
    ///
    /// Sends a single `POST /upload` with one `images` part per media item
    /// and one `metadata` part holding the JSON-encoded parameters.
    pub async fn upload(
        &self,
        media: &[MediaItem],
        metadata: &UploadMetadata,
    ) -> Result<SongResult, SongGenApiError> {
        let form = Self::build_form(media, metadata)?;

        let response = self
            .client
            .post(format!("{}/upload", self.api_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Check whether the final artifact for `job_id` is ready.
    ///
    /// Sends a `GET /download?id={job_id}` request.
    pub async fn download_status(&self, job_id: &str) -> Result<DownloadStatus, SongGenApiError> {
        let response = self
            .client
            .get(format!("{}/download", self.api_url))
            .query(&[("id", job_id)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ask the service whether it is up.
    ///
    /// Returns `true` only for a 2xx response reporting `"healthy"`.
    pub async fn health(&self) -> Result<bool, SongGenApiError> {
        let response = self
            .client
            .get(format!("{}/health", self.api_url))
            .send()
            .await?;

        let health: HealthResponse = Self::parse_response(response).await?;
        Ok(health.status == "healthy")
    }

    /// Download the finished audio file from the URL the service reported.
    pub async fn fetch_artifact(&self, audio_url: &str) -> Result<Vec<u8>, SongGenApiError> {
        let response = self.client.get(audio_url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    fn client_builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder().user_agent(USER_AGENT)
    }

    fn build_form(media: &[MediaItem], metadata: &UploadMetadata) -> Result<Form, SongGenApiError> {
        let mut form = Form::new();

        for item in media {
            let part = Part::bytes(item.bytes().to_vec())
                .file_name(item.file_name().to_string())
                .mime_str(item.kind().mime_type())?;
            form = form.part(FIELD_IMAGES, part);
        }

        let metadata_json = metadata
            .to_json()
            .map_err(|e| SongGenApiError::Payload(e.to_string()))?;

        Ok(form.text(FIELD_METADATA, metadata_json))
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`SongGenApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SongGenApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SongGenApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SongGenApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
