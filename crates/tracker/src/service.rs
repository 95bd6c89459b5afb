//! Seam between the job tracker and the server it talks to.
//!
//! [`JobTracker`](crate::tracker::JobTracker) only needs to upload a file
//! and ask for a job's status. [`DubbingApi`] is the production
//! implementation; tests supply scripted ones.

use vdub_core::types::JobId;
use vdub_core::upload::ValidRequest;

use crate::api::{DubbingApi, DubbingApiError, UploadProgress};
use crate::messages::StatusReport;

/// Operations the tracker performs against a dubbing server.
pub trait JobService: Send + Sync {
    /// Transmit a validated upload and return the issued job ID.
    fn upload(
        &self,
        request: ValidRequest,
        on_progress: UploadProgress,
    ) -> impl std::future::Future<Output = Result<JobId, DubbingApiError>> + Send;

    /// Fetch one status report for a job.
    fn job_status(
        &self,
        job_id: &JobId,
    ) -> impl std::future::Future<Output = Result<StatusReport, DubbingApiError>> + Send;

    /// Where the finished video can be downloaded.
    fn download_url(&self, job_id: &JobId) -> String;
}

impl JobService for DubbingApi {
    async fn upload(
        &self,
        request: ValidRequest,
        on_progress: UploadProgress,
    ) -> Result<JobId, DubbingApiError> {
        DubbingApi::upload(self, request, on_progress).await
    }

    async fn job_status(&self, job_id: &JobId) -> Result<StatusReport, DubbingApiError> {
        Ok(self.get_status(job_id).await?.into_report())
    }

    fn download_url(&self, job_id: &JobId) -> String {
        DubbingApi::download_url(self, job_id)
    }
}
