//! Dismissible notification area.
//!
//! UI adapters feed [`TrackerEvent::Notice`](crate::events::TrackerEvent)
//! messages into a [`NotificationArea`] and render [`active`]
//! notices. Each notice can be dismissed by ID and expires on its own
//! after [`NOTICE_AUTO_DISMISS_SECS`] seconds.
//!
//! [`active`]: NotificationArea::active

use serde::Serialize;
use vdub_core::notice::{Severity, NOTICE_AUTO_DISMISS_SECS};
use vdub_core::types::Timestamp;

/// A notice currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub shown_at: Timestamp,
}

impl Notification {
    pub fn expires_at(&self) -> Timestamp {
        self.shown_at + chrono::Duration::seconds(NOTICE_AUTO_DISMISS_SECS)
    }
}

#[derive(Debug, Default)]
pub struct NotificationArea {
    next_id: u64,
    notices: Vec<Notification>,
}

impl NotificationArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notice and return its ID.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>, now: Timestamp) -> u64 {
        self.next_id += 1;
        self.notices.push(Notification {
            id: self.next_id,
            severity,
            message: message.into(),
            shown_at: now,
        });
        self.next_id
    }

    /// Dismiss a notice. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    /// Drop every notice whose display time has elapsed. Returns how many
    /// were removed.
    pub fn prune_expired(&mut self, now: Timestamp) -> usize {
        let before = self.notices.len();
        self.notices.retain(|n| n.expires_at() > now);
        before - self.notices.len()
    }

    /// Notices in display order (oldest first).
    pub fn active(&self) -> &[Notification] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let mut area = NotificationArea::new();
        let a = area.push(Severity::Info, "first", t0());
        let b = area.push(Severity::Danger, "second", t0());
        assert!(b > a);
        let messages: Vec<&str> = area.active().iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[test]
    fn dismiss_removes_only_target() {
        let mut area = NotificationArea::new();
        let a = area.push(Severity::Warning, "a", t0());
        let b = area.push(Severity::Success, "b", t0());
        assert!(area.dismiss(a));
        assert!(!area.dismiss(a));
        assert_eq!(area.active().len(), 1);
        assert_eq!(area.active()[0].id, b);
    }

    #[test]
    fn notices_expire_after_ten_seconds() {
        let mut area = NotificationArea::new();
        area.push(Severity::Info, "old", t0());
        area.push(Severity::Info, "new", t0() + Duration::seconds(5));

        assert_eq!(area.prune_expired(t0() + Duration::seconds(9)), 0);
        assert_eq!(area.prune_expired(t0() + Duration::seconds(10)), 1);
        assert_eq!(area.active()[0].message, "new");
        assert_eq!(area.prune_expired(t0() + Duration::seconds(15)), 1);
        assert!(area.active().is_empty());
    }
}
