//! `vdub` library crate.
//!
//! Re-exports the terminal adapter for testing. The binary entrypoint
//! lives in `main.rs`.

pub mod ui;
