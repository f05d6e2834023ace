/// Notification delivery
///
/// - [`dispatcher`]: turns lifecycle and deadline events into persisted
///   notifications and hands each one to a publisher
/// - [`hub`]: per-user broadcast rooms feeding connected WebSocket clients
///
/// The durable inbox is authoritative; live delivery is best effort.

pub mod dispatcher;
pub mod hub;

pub use dispatcher::NotificationDispatcher;
pub use hub::NotificationHub;

use crate::models::notification::Notification;

/// Pushes a persisted notification to its recipient's live connections
///
/// Implementations must not block; a recipient without connections is not an
/// error.
pub trait NotificationPublisher: Send + Sync {
    /// Returns how many live connections received the notification
    fn publish(&self, notification: &Notification) -> usize;
}

/// Publisher for processes without live connections (e.g. the standalone worker)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl NotificationPublisher for NoopPublisher {
    fn publish(&self, _notification: &Notification) -> usize {
        0
    }
}
