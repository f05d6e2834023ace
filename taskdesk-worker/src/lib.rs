//! # TaskDesk Worker Library
//!
//! Background jobs that run next to the API: today that is the deadline
//! sweep, which raises deadline notifications and enforces notification
//! retention.
//!
//! ## Modules
//!
//! - `config`: `SWEEP_*` settings
//! - `sweep`: the periodic deadline scan
//!
//! The API server embeds [`sweep::DeadlineSweep`] with its live notification
//! hub; the `taskdesk-worker` binary runs it standalone.

pub mod config;
pub mod sweep;
