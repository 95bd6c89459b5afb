//! Dubbing server client and upload-and-poll job tracker.
//!
//! Provides the HTTP API wrapper, typed response parsing, the
//! [`JobService`](service::JobService) seam, poll bookkeeping, the
//! [`JobTracker`](tracker::JobTracker) state machine and the events it
//! broadcasts to UI adapters.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod messages;
pub mod notifications;
pub mod poll;
pub mod service;
pub mod tracker;
