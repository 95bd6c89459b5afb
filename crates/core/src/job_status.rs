//! Job status values reported by the dubbing server.
//!
//! The server walks a job through many named stages (`uploaded`,
//! `extracting_audio`, `transcribing`, ...). The client only needs to
//! know whether a stage is terminal, so every non-terminal stage collapses
//! into [`JobStatus::Processing`].

use serde::{Deserialize, Serialize};

/// Job finished and the dubbed video can be downloaded.
pub const STATUS_COMPLETED: &str = "completed";
/// Job failed on the server.
pub const STATUS_ERROR: &str = "error";

/// Coarse job status as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted by the server and not yet finished.
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Classify a raw server status string.
    pub fn from_wire(status: &str) -> Self {
        match status {
            STATUS_COMPLETED => Self::Completed,
            STATUS_ERROR => Self::Error,
            _ => Self::Processing,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert_eq!(JobStatus::from_wire("completed"), JobStatus::Completed);
        assert_eq!(JobStatus::from_wire("error"), JobStatus::Error);
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn pipeline_stages_are_processing() {
        for stage in [
            "uploaded",
            "loading_model",
            "extracting_audio",
            "transcribing",
            "translating",
            "merging",
            "processing",
            "",
        ] {
            assert_eq!(JobStatus::from_wire(stage), JobStatus::Processing, "{stage}");
        }
        assert!(!JobStatus::Processing.is_terminal());
    }
}
