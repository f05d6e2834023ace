/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Login, token refresh, current user, password change
/// - `tasks`: Task lifecycle endpoints
/// - `notifications`: The caller's notification inbox
/// - `users`: User administration (managers)
/// - `dashboard`: Task counters
/// - `ws`: Live notification WebSocket

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod tasks;
pub mod users;
pub mod ws;

use serde::Serialize;

/// Body for endpoints that only acknowledge
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
