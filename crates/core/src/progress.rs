//! Progress arithmetic shared by the tracker and UI adapters.
//!
//! Overall progress runs 0-100. The first [`UPLOAD_PHASE_PERCENT`] points
//! are reserved for transmitting the file; the server's own progress
//! reports cover the full range once the job exists.

use serde::Serialize;

/// Share of the overall progress bar covered by the upload phase.
pub const UPLOAD_PHASE_PERCENT: u8 = 20;

/// Colour band for a progress value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBand {
    /// Below 25%.
    Info,
    /// 25% up to (not including) 75%.
    Warning,
    /// 75% and above.
    Success,
}

impl ProgressBand {
    pub fn for_percent(percent: u8) -> Self {
        if percent < 25 {
            Self::Info
        } else if percent < 75 {
            Self::Warning
        } else {
            Self::Success
        }
    }
}

/// Clamp a server-reported progress value into `0..=100`.
pub fn clamp_percent(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Map transmitted bytes onto the upload band (`0..=UPLOAD_PHASE_PERCENT`).
///
/// An empty payload counts as fully sent.
pub fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return UPLOAD_PHASE_PERCENT;
    }
    let sent = sent.min(total);
    ((sent as u128 * UPLOAD_PHASE_PERCENT as u128) / total as u128) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ProgressBand::for_percent(0), ProgressBand::Info);
        assert_eq!(ProgressBand::for_percent(24), ProgressBand::Info);
        assert_eq!(ProgressBand::for_percent(25), ProgressBand::Warning);
        assert_eq!(ProgressBand::for_percent(74), ProgressBand::Warning);
        assert_eq!(ProgressBand::for_percent(75), ProgressBand::Success);
        assert_eq!(ProgressBand::for_percent(100), ProgressBand::Success);
    }

    #[test]
    fn clamp_out_of_range() {
        assert_eq!(clamp_percent(-5), 0);
        assert_eq!(clamp_percent(42), 42);
        assert_eq!(clamp_percent(250), 100);
    }

    #[test]
    fn upload_band_scaling() {
        assert_eq!(upload_percent(0, 1000), 0);
        assert_eq!(upload_percent(500, 1000), 10);
        assert_eq!(upload_percent(1000, 1000), 20);
        assert_eq!(upload_percent(5000, 1000), 20);
    }

    #[test]
    fn upload_band_empty_payload() {
        assert_eq!(upload_percent(0, 0), UPLOAD_PHASE_PERCENT);
    }
}
