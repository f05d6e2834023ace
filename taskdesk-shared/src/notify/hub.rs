/// Per-user real-time rooms
///
/// Each user with at least one live connection owns a broadcast channel.
/// Connections subscribe on authentication and release the room on
/// disconnect; the room disappears with its last receiver.
///
/// # Example
///
/// ```
/// use taskdesk_shared::notify::{NotificationHub, NotificationPublisher};
///
/// let hub = NotificationHub::default();
/// let rx = hub.subscribe(7);
/// assert_eq!(hub.connection_count(7), 1);
///
/// drop(rx);
/// hub.release(7);
/// assert_eq!(hub.connection_count(7), 0);
/// ```

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use super::NotificationPublisher;
use crate::models::notification::Notification;

/// Default per-room buffer; slower receivers skip ahead
pub const DEFAULT_ROOM_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct NotificationHub {
    rooms: DashMap<i64, broadcast::Sender<Notification>>,
    capacity: usize,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Joins the user's room, creating it on first use
    pub fn subscribe(&self, user_id: i64) -> broadcast::Receiver<Notification> {
        let capacity = self.capacity;
        self.rooms
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    /// Drops the user's room once no receiver is left
    ///
    /// Call after dropping the connection's receiver.
    pub fn release(&self, user_id: i64) {
        if self
            .rooms
            .remove_if(&user_id, |_, tx| tx.receiver_count() == 0)
            .is_some()
        {
            debug!(user_id, "Closed notification room");
        }
    }

    /// Live connections for a user
    pub fn connection_count(&self, user_id: i64) -> usize {
        self.rooms
            .get(&user_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Users with at least one room open
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_CAPACITY)
    }
}

impl NotificationPublisher for NotificationHub {
    fn publish(&self, notification: &Notification) -> usize {
        match self.rooms.get(&notification.user_id) {
            // send only fails when every receiver is gone
            Some(tx) => tx.send(notification.clone()).unwrap_or(0),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::{NotificationPriority, NotificationType};
    use chrono::Utc;

    fn notification(user_id: i64) -> Notification {
        Notification {
            id: 1,
            user_id,
            kind: NotificationType::TaskAssigned,
            title: "New task assigned".to_string(),
            message: "You have a new task".to_string(),
            task_id: Some(3),
            priority: NotificationPriority::Normal,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_only_the_recipient() {
        let hub = NotificationHub::default();
        let mut alice_a = hub.subscribe(1);
        let mut alice_b = hub.subscribe(1);
        let mut bob = hub.subscribe(2);

        assert_eq!(hub.publish(&notification(1)), 2);

        assert_eq!(alice_a.recv().await.unwrap().user_id, 1);
        assert_eq!(alice_b.recv().await.unwrap().user_id, 1);
        assert!(matches!(
            bob.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_publish_without_room_is_noop() {
        let hub = NotificationHub::default();
        assert_eq!(hub.publish(&notification(9)), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_release_keeps_room_while_receivers_remain() {
        let hub = NotificationHub::default();
        let first = hub.subscribe(1);
        let second = hub.subscribe(1);

        drop(first);
        hub.release(1);
        assert_eq!(hub.connection_count(1), 1);
        assert_eq!(hub.room_count(), 1);

        drop(second);
        hub.release(1);
        assert_eq!(hub.room_count(), 0);
    }
}
