use serde::Serialize;
use vdub_core::upload::ValidationError;

/// Every way a dubbing job can fail to reach a happy ending.
///
/// None of these escape the tracker as panics; each is reported to
/// subscribers as a notice and, when terminal, a
/// [`TrackerEvent::Failed`](crate::events::TrackerEvent::Failed).
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TrackerError {
    /// Bad input; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Upload transport failure or server rejection.
    #[error("{0}")]
    Submission(String),

    /// The server reported the job as failed.
    #[error("{0}")]
    Job(String),

    /// A single status check failed; polling continues.
    #[error("Status check failed: {0}")]
    TransientPoll(String),

    /// The attempt budget ran out before a terminal status.
    #[error("Processing took too long. Please try again.")]
    Timeout { attempts: u32 },
}

impl TrackerError {
    /// Whether this error ends the current job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::TransientPoll(_))
    }
}
