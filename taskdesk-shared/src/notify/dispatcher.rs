/// Notification dispatcher
///
/// One method per notification kind. Each renders a deterministic English
/// message, persists exactly one row for one recipient, then publishes it.
/// Failures are logged and swallowed: notifications are a side effect of a
/// task write that has already committed.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

use super::NotificationPublisher;
use crate::clock::Clock;
use crate::models::notification::{
    NewNotification, Notification, NotificationPriority, NotificationType,
};
use crate::models::task::{Task, TaskStatus};
use crate::repository::NotificationRepository;

#[derive(Clone)]
pub struct NotificationDispatcher {
    repo: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn NotificationPublisher>,
    clock: Arc<dyn Clock>,
}

fn due(deadline: Option<NaiveDate>) -> String {
    deadline
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "no date".to_string())
}

fn render(
    task: &Task,
    recipient: i64,
    kind: NotificationType,
    priority: NotificationPriority,
    title: &str,
    message: String,
) -> NewNotification {
    NewNotification {
        user_id: recipient,
        kind,
        title: title.to_string(),
        message,
        task_id: Some(task.id),
        priority,
    }
}

/// Message templates, kept pure so they can be checked without storage
pub mod templates {
    use super::*;

    pub fn task_assigned(task: &Task, assigned_by: &str) -> NewNotification {
        let mut message = format!("{} assigned you the task \"{}\"", assigned_by, task.title);
        if let Some(deadline) = task.deadline {
            message.push_str(&format!(" (deadline {})", deadline.format("%Y-%m-%d")));
        }
        render(
            task,
            task.employee_id,
            NotificationType::TaskAssigned,
            NotificationPriority::Normal,
            "New task assigned",
            message,
        )
    }

    pub fn task_completed(task: &Task, recipient: i64, completed_by: &str) -> NewNotification {
        render(
            task,
            recipient,
            NotificationType::TaskCompleted,
            NotificationPriority::Normal,
            "Task completed",
            format!("{} completed the task \"{}\"", completed_by, task.title),
        )
    }

    pub fn reassigned_away(task: &Task, previous_employee: i64, by: &str) -> NewNotification {
        render(
            task,
            previous_employee,
            NotificationType::TaskReassigned,
            NotificationPriority::Normal,
            "Task reassigned",
            format!("{} reassigned the task \"{}\" to another employee", by, task.title),
        )
    }

    pub fn reassigned_to(task: &Task, by: &str) -> NewNotification {
        render(
            task,
            task.employee_id,
            NotificationType::TaskReassigned,
            NotificationPriority::Normal,
            "New task assigned",
            format!("{} assigned you the task \"{}\"", by, task.title),
        )
    }

    pub fn status_changed(
        task: &Task,
        recipient: i64,
        previous: TaskStatus,
        changed_by: &str,
    ) -> NewNotification {
        render(
            task,
            recipient,
            NotificationType::StatusChanged,
            NotificationPriority::Normal,
            "Task status changed",
            format!(
                "{} changed the status of \"{}\" from {} to {}",
                changed_by,
                task.title,
                previous.label(),
                task.status.label()
            ),
        )
    }

    pub fn work_report_added(task: &Task, recipient: i64, reported_by: &str) -> NewNotification {
        render(
            task,
            recipient,
            NotificationType::WorkReportAdded,
            NotificationPriority::Normal,
            "Work report added",
            format!("{} added a work report to \"{}\"", reported_by, task.title),
        )
    }

    pub fn deadline_approaching(task: &Task, recipient: i64) -> NewNotification {
        render(
            task,
            recipient,
            NotificationType::DeadlineApproaching,
            NotificationPriority::High,
            "Deadline approaching",
            format!("The task \"{}\" is due on {}", task.title, due(task.deadline)),
        )
    }

    pub fn task_overdue(task: &Task, recipient: i64) -> NewNotification {
        render(
            task,
            recipient,
            NotificationType::TaskOverdue,
            NotificationPriority::Urgent,
            "Task overdue",
            format!(
                "The task \"{}\" was due on {} and is not finished",
                task.title,
                due(task.deadline)
            ),
        )
    }
}

impl NotificationDispatcher {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            publisher,
            clock,
        }
    }

    /// Persists and publishes one notification
    ///
    /// Returns `None` if it could not be stored.
    pub async fn dispatch(&self, notification: NewNotification) -> Option<Notification> {
        let kind = notification.kind;
        let user_id = notification.user_id;

        match self.repo.create(notification, self.clock.now()).await {
            Ok(stored) => {
                let delivered = self.publisher.publish(&stored);
                debug!(
                    notification_id = stored.id,
                    user_id,
                    kind = ?kind,
                    delivered,
                    "Notification dispatched"
                );
                Some(stored)
            }
            Err(e) => {
                warn!(user_id, kind = ?kind, error = %e, "Failed to store notification");
                None
            }
        }
    }

    pub async fn task_assigned(&self, task: &Task, assigned_by: &str) -> Option<Notification> {
        self.dispatch(templates::task_assigned(task, assigned_by)).await
    }

    pub async fn task_completed(
        &self,
        task: &Task,
        recipient: i64,
        completed_by: &str,
    ) -> Option<Notification> {
        self.dispatch(templates::task_completed(task, recipient, completed_by))
            .await
    }

    /// Tells the previous assignee the task moved to someone else
    pub async fn task_reassigned_away(
        &self,
        task: &Task,
        previous_employee: i64,
        by: &str,
    ) -> Option<Notification> {
        self.dispatch(templates::reassigned_away(task, previous_employee, by))
            .await
    }

    /// Tells the new assignee the task is now theirs
    pub async fn task_reassigned_to(&self, task: &Task, by: &str) -> Option<Notification> {
        self.dispatch(templates::reassigned_to(task, by)).await
    }

    pub async fn status_changed(
        &self,
        task: &Task,
        recipient: i64,
        previous: TaskStatus,
        changed_by: &str,
    ) -> Option<Notification> {
        self.dispatch(templates::status_changed(task, recipient, previous, changed_by))
            .await
    }

    pub async fn work_report_added(
        &self,
        task: &Task,
        recipient: i64,
        reported_by: &str,
    ) -> Option<Notification> {
        self.dispatch(templates::work_report_added(task, recipient, reported_by))
            .await
    }

    pub async fn deadline_approaching(&self, task: &Task, recipient: i64) -> Option<Notification> {
        self.dispatch(templates::deadline_approaching(task, recipient))
            .await
    }

    pub async fn task_overdue(&self, task: &Task, recipient: i64) -> Option<Notification> {
        self.dispatch(templates::task_overdue(task, recipient)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::task::TaskPriority;
    use crate::models::user::{CreateUser, UserRole};
    use crate::notify::NotificationHub;
    use crate::repository::{InMemoryStore, UserRepository};
    use chrono::{TimeZone, Utc};

    fn task(employee_id: i64) -> Task {
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        Task {
            id: 1,
            title: "Fix printer".to_string(),
            description: None,
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            task_date: None,
            deadline: NaiveDate::from_ymd_opt(2025, 3, 12),
            device_model: None,
            serial_number: None,
            reported_issue: None,
            work_report: None,
            cancellation_reason: None,
            employee_id,
            creator_id: Some(1),
            actual_start_time: None,
            actual_end_time: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_templates() {
        let t = task(7);

        let assigned = templates::task_assigned(&t, "Maria Manager");
        assert_eq!(assigned.user_id, 7);
        assert_eq!(assigned.title, "New task assigned");
        assert_eq!(
            assigned.message,
            "Maria Manager assigned you the task \"Fix printer\" (deadline 2025-03-12)"
        );

        let changed = templates::status_changed(&t, 1, TaskStatus::Open, "Eli");
        assert_eq!(changed.kind, NotificationType::StatusChanged);
        assert_eq!(
            changed.message,
            "Eli changed the status of \"Fix printer\" from Open to In progress"
        );

        let overdue = templates::task_overdue(&t, 7);
        assert_eq!(overdue.priority, NotificationPriority::Urgent);
        assert_eq!(
            templates::deadline_approaching(&t, 7).priority,
            NotificationPriority::High
        );

        let away = templates::reassigned_away(&t, 5, "Maria");
        let to = templates::reassigned_to(&t, "Maria");
        assert_eq!(away.kind, NotificationType::TaskReassigned);
        assert_eq!(to.kind, NotificationType::TaskReassigned);
        assert_eq!(away.user_id, 5);
        assert_eq!(to.user_id, 7);
        assert_ne!(away.title, to.title);
    }

    #[tokio::test]
    async fn test_dispatch_persists_then_publishes() {
        let store = InMemoryStore::new();
        let hub = Arc::new(NotificationHub::default());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap()));
        let emp = UserRepository::create(
            &store,
            CreateUser {
                full_name: "Eli".to_string(),
                username: "eli".to_string(),
                password_hash: "x".to_string(),
                role: UserRole::Employee,
            },
            clock.now(),
        )
        .await
        .unwrap();

        let dispatcher =
            NotificationDispatcher::new(Arc::new(store.clone()), hub.clone(), clock.clone());
        let mut rx = hub.subscribe(emp.id);

        let stored = dispatcher
            .task_assigned(&task(emp.id), "Maria")
            .await
            .expect("stored");

        assert_eq!(rx.recv().await.unwrap(), stored);
        assert_eq!(stored.created_at, clock.now());
        assert_eq!(
            crate::repository::NotificationRepository::unread_count(&store, emp.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_swallowed() {
        let store = InMemoryStore::new();
        let dispatcher = NotificationDispatcher::new(
            Arc::new(store),
            Arc::new(crate::notify::NoopPublisher),
            Arc::new(crate::clock::SystemClock),
        );

        // recipient does not exist
        assert!(dispatcher.task_overdue(&task(404), 404).await.is_none());
    }
}
