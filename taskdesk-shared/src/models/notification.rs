/// Notification model and database operations
///
/// Notifications form a per-user inbox. Rows are written only by the
/// notification dispatcher; recipients can mark them read or delete them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id                BIGSERIAL PRIMARY KEY,
///     user_id           BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     notification_type notification_type NOT NULL,
///     title             VARCHAR(255) NOT NULL,
///     message           TEXT NOT NULL,
///     task_id           BIGINT REFERENCES tasks (id) ON DELETE SET NULL,
///     priority          notification_priority NOT NULL DEFAULT 'normal',
///     is_read           BOOLEAN NOT NULL DEFAULT FALSE,
///     read_at           TIMESTAMPTZ,
///     created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::Pagination;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, notification_type, title, message, task_id, priority, is_read, read_at, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    TaskCompleted,
    TaskReassigned,
    StatusChanged,
    WorkReportAdded,
    DeadlineApproaching,
    TaskOverdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Urgent,
    High,
    Normal,
    Low,
}

/// Inbox entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,

    /// Recipient
    pub user_id: i64,

    #[serde(rename = "type")]
    #[sqlx(rename = "notification_type")]
    pub kind: NotificationType,

    pub title: String,
    pub message: String,

    /// Related task, cleared when that task is deleted
    pub task_id: Option<i64>,

    pub priority: NotificationPriority,
    pub is_read: bool,

    /// First time the recipient marked it read
    pub read_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Marks read; a repeat call keeps the original `read_at`
    pub fn apply_read(&mut self, at: DateTime<Utc>) {
        self.is_read = true;
        if self.read_at.is_none() {
            self.read_at = Some(at);
        }
    }
}

/// Input for creating a notification
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub task_id: Option<i64>,
    pub priority: NotificationPriority,
}

/// Inbox listing options
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationQuery {
    pub unread_only: bool,
    pub pagination: Pagination,
}

/// A page of the inbox with its counters
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,

    /// Rows matching the query (respects `unread_only`)
    pub total: i64,

    /// Unread rows in the whole inbox
    pub unread_count: i64,

    pub page: u32,
    pub limit: u32,
}

impl Notification {
    pub async fn create(
        pool: &PgPool,
        data: NewNotification,
        at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message, task_id, priority, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(data.kind)
        .bind(data.title)
        .bind(data.message)
        .bind(data.task_id)
        .bind(data.priority)
        .bind(at)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's inbox, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i64,
        query: NotificationQuery,
    ) -> Result<NotificationPage, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (total, unread_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE NOT $2 OR NOT is_read),
                COUNT(*) FILTER (WHERE NOT is_read)
            FROM notifications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(query.unread_only)
        .fetch_one(&mut *tx)
        .await?;

        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_id)
        .bind(query.unread_only)
        .bind(i64::from(query.pagination.limit))
        .bind(query.pagination.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(NotificationPage {
            notifications,
            total,
            unread_count,
            page: query.pagination.page,
            limit: query.pagination.limit,
        })
    }

    pub async fn unread_count(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Marks one of the user's notifications read
    ///
    /// Returns `None` when the notification does not exist or belongs to
    /// someone else.
    pub async fn mark_read(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, $3)
            WHERE id = $1 AND user_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(at)
        .fetch_optional(pool)
        .await
    }

    /// Marks every unread notification of the user read
    pub async fn mark_all_read(
        pool: &PgPool,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one of the user's notifications
    pub async fn delete(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the user's notifications, or only the read ones
    pub async fn delete_all(
        pool: &PgPool,
        user_id: i64,
        read_only: bool,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND (NOT $2 OR is_read)")
                .bind(user_id)
                .bind(read_only)
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Removes read notifications created before `cutoff`
    pub async fn purge_read_before(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE is_read AND created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serializes_kind_as_type() {
        let n = Notification {
            id: 5,
            user_id: 7,
            kind: NotificationType::DeadlineApproaching,
            title: "Deadline approaching".to_string(),
            message: "The task \"Fix printer\" is due on 2025-03-12".to_string(),
            task_id: Some(1),
            priority: NotificationPriority::High,
            is_read: false,
            read_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "deadline_approaching");
        assert_eq!(json["priority"], "high");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_apply_read_keeps_first_timestamp() {
        let first = Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap();
        let mut n = Notification {
            id: 1,
            user_id: 1,
            kind: NotificationType::TaskAssigned,
            title: String::new(),
            message: String::new(),
            task_id: None,
            priority: NotificationPriority::Normal,
            is_read: false,
            read_at: None,
            created_at: first,
        };

        n.apply_read(first);
        n.apply_read(first + chrono::Duration::hours(1));

        assert!(n.is_read);
        assert_eq!(n.read_at, Some(first));
    }
}
