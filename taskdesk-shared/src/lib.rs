//! # TaskDesk Shared Library
//!
//! This crate contains the data model, persistence, and business rules shared
//! by the TaskDesk API server and the deadline sweep worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `repository`: Storage traits with PostgreSQL and in-memory implementations
//! - `lifecycle`: Task state machine and permission rules
//! - `notify`: Notification templates, persistence, and live fan-out
//! - `auth`: Authentication and authorization utilities
//! - `db`: Connection pool and migrations
//! - `clock`: Injectable time source

pub mod auth;
pub mod clock;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod repository;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
