//! Dubbing server response bodies and parser.
//!
//! The server answers every JSON endpoint with a flat object. Optional
//! fields are modelled as `Option` because the server omits them freely
//! (`job_id` is only present on success, `progress` may be missing on
//! `not_found`).

use serde::{Deserialize, Serialize};
use vdub_core::job_status::JobStatus;
use vdub_core::progress::clamp_percent;

/// Body of `POST /upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Present only when `success` is true.
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /status/{job_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Raw pipeline stage, e.g. `transcribing` or `completed`.
    pub status: String,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Normalized result of one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    /// Stage name as sent by the server.
    pub stage: String,
    /// Progress clamped to `0..=100`.
    pub progress: u8,
    pub message: String,
}

impl StatusResponse {
    pub fn into_report(self) -> StatusReport {
        StatusReport {
            status: JobStatus::from_wire(&self.status),
            progress: clamp_percent(self.progress.unwrap_or(0)),
            message: self.message.unwrap_or_default(),
            stage: self.status,
        }
    }
}

/// One row of the recent-jobs list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub target_language: String,
    #[serde(default)]
    pub source_language: Option<String>,
    /// Naive UTC timestamps as written by the server.
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<chrono::NaiveDateTime>,
    /// Upload size in bytes.
    #[serde(default)]
    pub file_size: Option<i64>,
    /// Video duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Body of `GET /jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobListResponse {
    pub success: bool,
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
}

/// User preferences accepted by `POST /preferences`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Body of `POST /preferences`.
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}
