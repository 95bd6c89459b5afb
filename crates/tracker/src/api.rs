//! REST API client for the dubbing server.
//!
//! Wraps the server's HTTP endpoints (upload, status, job history,
//! preferences, download) using [`reqwest`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use vdub_core::notice::MSG_UPLOAD_FAILED;
use vdub_core::types::JobId;
use tokio_util::io::ReaderStream;
use vdub_core::upload::{ValidRequest, VideoSource, FIELD_TARGET_LANGUAGE, FIELD_VIDEO};

use crate::messages::{
    JobListResponse, JobSummary, Preferences, PreferencesResponse, StatusResponse, UploadResponse,
};

/// Bytes handed to the HTTP body per chunk while uploading.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Default timeout for short JSON requests (status, jobs, preferences).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Callback receiving `(bytes_sent, bytes_total)` during an upload.
pub type UploadProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// HTTP client for one dubbing server.
#[derive(Clone)]
pub struct DubbingApi {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

/// Errors from the dubbing REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum DubbingApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Dubbing API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The server answered but refused the request (`success: false`).
    #[error("{0}")]
    Rejected(String),

    /// Writing a downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DubbingApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Server root, e.g. `http://host:5000`. A trailing
    ///   slash is stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the timeout applied to short JSON requests. Uploads and
    /// downloads are never subject to it.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of the dubbed video for a job.
    pub fn download_url(&self, job_id: &JobId) -> String {
        format!("{}/download/{}", self.base_url, job_id)
    }

    /// Upload a validated video.
    ///
    /// Sends a multipart `POST /upload` with the `video` file part and the
    /// `target_language` field. The body is streamed in
    /// [`UPLOAD_CHUNK_BYTES`] chunks, read from disk as it goes for
    /// [`VideoSource::Path`] files, and `on_progress` is invoked as each
    /// chunk is handed to the transport.
    pub async fn upload(
        &self,
        request: ValidRequest,
        on_progress: UploadProgress,
    ) -> Result<JobId, DubbingApiError> {
        let (file, target_language) = request.into_parts();
        let total = file.size();
        let file_name = file.name.clone();

        let body = match file.into_source() {
            VideoSource::Memory(data) => memory_body(data, total, on_progress),
            VideoSource::Path(path) => {
                let handle = tokio::fs::File::open(&path).await?;
                file_body(handle, total, on_progress)
            }
        };

        let part = reqwest::multipart::Part::stream_with_length(body, total)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;

        let form = reqwest::multipart::Form::new()
            .text(FIELD_TARGET_LANGUAGE, target_language)
            .part(FIELD_VIDEO, part);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::parse_response(response).await?;
        match (body.success, body.job_id) {
            (true, Some(job_id)) if !job_id.is_empty() => Ok(JobId::new(job_id)),
            _ => Err(DubbingApiError::Rejected(
                body.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| MSG_UPLOAD_FAILED.to_string()),
            )),
        }
    }

    /// Fetch the current status of a job via `GET /status/{job_id}`.
    pub async fn get_status(&self, job_id: &JobId) -> Result<StatusResponse, DubbingApiError> {
        let response = self
            .client
            .get(format!("{}/status/{}", self.base_url, job_id))
            .timeout(self.request_timeout)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List the most recent jobs via `GET /jobs`.
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, DubbingApiError> {
        let response = self
            .client
            .get(format!("{}/jobs", self.base_url))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let body: JobListResponse = Self::parse_response(response).await?;
        if !body.success {
            return Err(DubbingApiError::Rejected("Failed to list jobs".to_string()));
        }
        Ok(body.jobs)
    }

    /// Store user preferences via a form-encoded `POST /preferences`.
    pub async fn set_preferences(
        &self,
        preferences: &Preferences,
    ) -> Result<PreferencesResponse, DubbingApiError> {
        let response = self
            .client
            .post(format!("{}/preferences", self.base_url))
            .timeout(self.request_timeout)
            .form(preferences)
            .send()
            .await?;

        let body: PreferencesResponse = Self::parse_response(response).await?;
        if !body.success {
            return Err(DubbingApiError::Rejected(
                body.message
                    .unwrap_or_else(|| "Failed to update preferences".to_string()),
            ));
        }
        Ok(body)
    }

    /// Stream the dubbed video for `job_id` into `dest`.
    ///
    /// The server redirects to its HTML index page when the output is not
    /// available, so an HTML response is reported as a rejection rather
    /// than written to disk.
    pub async fn download_to(
        &self,
        job_id: &JobId,
        dest: &Path,
    ) -> Result<PathBuf, DubbingApiError> {
        let response = self.client.get(self.download_url(job_id)).send().await?;
        let response = Self::ensure_success(response).await?;

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            return Err(DubbingApiError::Rejected(
                "Video not found or processing not complete".to_string(),
            ));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::info!(job_id = %job_id, bytes = written, path = %dest.display(), "Downloaded dubbed video");
        Ok(dest.to_path_buf())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`DubbingApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DubbingApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DubbingApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DubbingApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Chunk an in-memory payload, reporting cumulative bytes as each chunk
/// is taken.
fn memory_body(data: Vec<u8>, total: u64, on_progress: UploadProgress) -> reqwest::Body {
    let chunks = futures::stream::unfold((data, 0usize), move |(data, offset)| {
        let on_progress = Arc::clone(&on_progress);
        async move {
            if offset >= data.len() {
                return None;
            }
            let end = (offset + UPLOAD_CHUNK_BYTES).min(data.len());
            let chunk = data[offset..end].to_vec();
            on_progress(end as u64, total);
            Some((Ok::<_, std::io::Error>(chunk), (data, end)))
        }
    });
    reqwest::Body::wrap_stream(chunks)
}

/// Read a file in chunks, reporting cumulative bytes (capped at the
/// declared size) as each chunk is read.
fn file_body(file: tokio::fs::File, total: u64, on_progress: UploadProgress) -> reqwest::Body {
    let mut sent: u64 = 0;
    let chunks = ReaderStream::with_capacity(file, UPLOAD_CHUNK_BYTES).map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            on_progress(sent.min(total), total);
        }
        chunk
    });
    reqwest::Body::wrap_stream(chunks)
}
