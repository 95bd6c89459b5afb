//! Events emitted by the job tracker.
//!
//! These are the only way tracker state reaches a UI. Adapters call
//! [`JobTracker::subscribe`](crate::tracker::JobTracker::subscribe) and
//! render each event; the tracker never touches presentation itself.

use serde::Serialize;
use vdub_core::notice::Severity;
use vdub_core::types::JobId;

use crate::error::TrackerError;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// Overall progress changed.
    Progress {
        /// `None` while the file is still uploading.
        job_id: Option<JobId>,
        /// Completion percentage (0-100).
        percent: u8,
        message: String,
    },

    /// Something worth telling the user that does not change progress.
    Notice { severity: Severity, message: String },

    /// The job finished; the dubbed video is downloadable.
    Completed { job_id: JobId, download_url: String },

    /// The job, or the upload that would have created it, failed.
    Failed {
        job_id: Option<JobId>,
        error: TrackerError,
    },

    /// The UI should return to its pre-submission state.
    Reset,
}

impl TrackerEvent {
    /// `Completed` and `Failed` end a job's event stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
