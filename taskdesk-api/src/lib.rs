//! # TaskDesk API Server Library
//!
//! HTTP and WebSocket front end for TaskDesk.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `bootstrap`: First manager account
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors
//! - `middleware`: Authentication and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
