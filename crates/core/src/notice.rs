//! User-facing notice severities and canonical messages.

use serde::Serialize;

/// Severity of a notice shown in the notification area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Info,
}

/// Seconds before a notice is dismissed automatically.
pub const NOTICE_AUTO_DISMISS_SECS: i64 = 10;

/// Shown when the dubbed video is ready.
pub const MSG_JOB_COMPLETED: &str =
    "Success! Your video has been dubbed. Click the download button to get your file.";

/// Fallback when the upload fails without a server-supplied reason.
pub const MSG_UPLOAD_FAILED: &str = "Error uploading video. Please try again.";

/// Fallback when the server reports a job error without a message.
pub const MSG_JOB_FAILED: &str = "Error processing video";

/// Shown when the poll budget runs out.
pub const MSG_TIMEOUT: &str = "Processing took too long. Please try again.";

/// Progress message at the start of an upload.
pub const MSG_UPLOADING: &str = "Uploading video...";

/// Ambient notice after repeated status check failures.
pub fn still_trying_message(failures: u32) -> String {
    format!("Still trying to reach the server ({failures} failed status checks)...")
}
