//! Terminal rendering of tracker events.
//!
//! [`TerminalUi`] is the presentation side of the tracker: it folds each
//! [`TrackerEvent`] into the progress bar, notification area and download
//! link, and returns the lines that should be printed for it.

use vdub_core::notice::Severity;
use vdub_core::progress::ProgressBand;
use vdub_core::types::Timestamp;
use vdub_tracker::events::TrackerEvent;
use vdub_tracker::notifications::{Notification, NotificationArea};

/// Width of the progress bar in characters, excluding brackets.
const BAR_WIDTH: usize = 20;

#[derive(Debug, Default)]
pub struct TerminalUi {
    notices: NotificationArea,
    percent: u8,
    message: String,
    download_url: Option<String>,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the lines to print for it.
    ///
    /// Expired notices are pruned first. A progress event that changes
    /// neither the percentage nor the message prints nothing.
    pub fn apply(&mut self, event: &TrackerEvent, now: Timestamp) -> Vec<String> {
        self.notices.prune_expired(now);

        match event {
            TrackerEvent::Progress {
                percent, message, ..
            } => {
                if *percent == self.percent && *message == self.message {
                    return Vec::new();
                }
                self.percent = *percent;
                self.message.clone_from(message);
                vec![progress_line(self.percent, &self.message)]
            }
            TrackerEvent::Notice { severity, message } => {
                self.notices.push(*severity, message.clone(), now);
                vec![notice_line(*severity, message)]
            }
            TrackerEvent::Completed { download_url, .. } => {
                self.percent = 100;
                self.download_url = Some(download_url.clone());
                vec![format!("Download: {download_url}")]
            }
            // The tracker already raised a danger notice with the reason.
            TrackerEvent::Failed { .. } => Vec::new(),
            TrackerEvent::Reset => {
                self.percent = 0;
                self.message.clear();
                self.download_url = None;
                Vec::new()
            }
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    /// Notices still on screen.
    pub fn notices(&self) -> &[Notification] {
        self.notices.active()
    }
}

/// `[#####---------------]  25% (warning) Transcribing audio...`
pub fn progress_line(percent: u8, message: &str) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    let band = match ProgressBand::for_percent(percent) {
        ProgressBand::Info => "info",
        ProgressBand::Warning => "warning",
        ProgressBand::Success => "success",
    };
    format!(
        "[{}{}] {percent:>3}% ({band}) {message}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
    )
}

pub fn notice_line(severity: Severity, message: &str) -> String {
    let tag = match severity {
        Severity::Success => "success",
        Severity::Warning => "warning",
        Severity::Danger => "error",
        Severity::Info => "info",
    };
    format!("[{tag}] {message}")
}
