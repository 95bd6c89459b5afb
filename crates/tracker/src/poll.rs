//! Fixed-cadence poll bookkeeping.
//!
//! Every status check, successful or not, spends one attempt from a
//! shared budget. Consecutive transport failures are tracked separately
//! so the user can be told, every few failures, that the client is still
//! trying.

use std::time::Duration;

/// Period between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Status checks allowed per job (about five minutes at the default
/// interval).
pub const MAX_POLL_ATTEMPTS: u32 = 150;

/// A "still trying" notice is emitted every this many consecutive
/// failed checks.
pub const FAILURE_NOTICE_EVERY: u32 = 5;

/// Tunable parameters for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status checks. The first check happens one interval
    /// after polling starts.
    pub interval: Duration,
    /// Checks allowed before the job is declared timed out.
    pub max_attempts: u32,
    /// Consecutive failures between "still trying" notices. Zero disables
    /// the notice.
    pub failure_notice_every: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
            failure_notice_every: FAILURE_NOTICE_EVERY,
        }
    }
}

/// Whether another status check may be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// Go ahead; carries the 1-based attempt number.
    Proceed(u32),
    /// Budget spent.
    Exhausted,
}

/// Per-job counters. Reset whenever a new job starts polling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    attempts: u32,
    consecutive_failures: u32,
}

impl PollState {
    /// Spend one attempt. Returns [`AttemptDecision::Exhausted`] once the
    /// count exceeds `max_attempts`.
    pub fn begin_attempt(&mut self, config: &PollConfig) -> AttemptDecision {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts > config.max_attempts {
            AttemptDecision::Exhausted
        } else {
            AttemptDecision::Proceed(self.attempts)
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Record a failed check. Returns `true` when a "still trying" notice
    /// is due.
    pub fn record_failure(&mut self, config: &PollConfig) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        config.failure_notice_every > 0
            && self.consecutive_failures % config.failure_notice_every == 0
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
