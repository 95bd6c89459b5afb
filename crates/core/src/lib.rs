//! `vdub-core` -- domain types and pure logic for the dubbing client.
//!
//! Nothing in this crate performs I/O. Upload validation, job status
//! classification, progress arithmetic and notice severities live here so
//! the tracker and any UI adapter agree on them.

pub mod error;
pub mod job_status;
pub mod notice;
pub mod progress;
pub mod types;
pub mod upload;
