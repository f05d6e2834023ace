//! In-memory repository for tests and local demos.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    NotificationRepository, RepositoryError, RepositoryResult, TaskRepository, UserRepository,
};
use crate::models::notification::{
    NewNotification, Notification, NotificationPage, NotificationQuery,
};
use crate::models::task::{
    DeadlineAlert, NewTask, Task, TaskFilter, TaskPage, TaskPatch, TaskStats, TaskStatus,
};
use crate::models::user::{CreateUser, UpdateUser, User, UserRole};
use crate::models::Pagination;

/// Thread-safe in-memory store implementing every repository trait.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    notifications: BTreeMap<i64, Notification>,
    last_user_id: i64,
    last_task_id: i64,
    last_notification_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    /// Runs `change` against an existing task, returning the updated copy
    fn modify_task(
        &self,
        id: i64,
        change: impl FnOnce(&mut Task) -> bool,
    ) -> RepositoryResult<Option<Task>> {
        let mut state = self.write()?;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if !change(task) {
            return Ok(None);
        }
        Ok(Some(task.clone()))
    }
}

impl State {
    fn require_user(&self, id: i64) -> RepositoryResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::Conflict(format!("User {} does not exist", id)))
        }
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn create(&self, task: NewTask, at: DateTime<Utc>) -> RepositoryResult<Task> {
        let mut state = self.write()?;
        state.require_user(task.employee_id)?;
        if let Some(creator_id) = task.creator_id {
            state.require_user(creator_id)?;
        }

        let id = next_id(&mut state.last_task_id);
        let task = Task {
            id,
            title: task.title,
            description: task.description,
            status: TaskStatus::Open,
            priority: task.priority,
            task_date: task.task_date,
            deadline: task.deadline,
            device_model: task.device_model,
            serial_number: task.serial_number,
            reported_issue: task.reported_issue,
            work_report: None,
            cancellation_reason: None,
            employee_id: task.employee_id,
            creator_id: task.creator_id,
            actual_start_time: None,
            actual_end_time: None,
            created_at: at,
            updated_at: at,
        };
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &TaskFilter,
        pagination: Pagination,
        today: NaiveDate,
    ) -> RepositoryResult<TaskPage> {
        let state = self.read()?;
        let mut matching: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| filter.matches(t, today))
            .cloned()
            .collect();
        newest_first(&mut matching, |t| (t.created_at, t.id));

        Ok(TaskPage {
            total: matching.len() as i64,
            tasks: pagination.slice(&matching),
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    async fn update(
        &self,
        id: i64,
        patch: TaskPatch,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        self.modify_task(id, |task| {
            task.apply_patch(patch, at);
            true
        })
    }

    async fn update_status(
        &self,
        id: i64,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        self.modify_task(id, |task| {
            if task.status == TaskStatus::Cancelled {
                return false;
            }
            task.apply_status(status, at);
            true
        })
    }

    async fn cancel(
        &self,
        id: i64,
        reason: String,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        self.modify_task(id, |task| {
            if task.status == TaskStatus::Cancelled {
                return false;
            }
            task.apply_cancel(reason, at);
            true
        })
    }

    async fn set_work_report(
        &self,
        id: i64,
        report: String,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        self.modify_task(id, |task| {
            task.work_report = Some(report);
            task.updated_at = at;
            true
        })
    }

    async fn reassign(
        &self,
        id: i64,
        employee_id: i64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        self.read()?.require_user(employee_id)?;
        self.modify_task(id, |task| {
            task.employee_id = employee_id;
            task.updated_at = at;
            true
        })
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        for notification in state.notifications.values_mut() {
            if notification.task_id == Some(id) {
                notification.task_id = None;
            }
        }
        Ok(true)
    }

    async fn stats(&self, employee_id: Option<i64>, today: NaiveDate) -> RepositoryResult<TaskStats> {
        let state = self.read()?;
        let mut stats = TaskStats::default();
        for task in state
            .tasks
            .values()
            .filter(|t| employee_id.map_or(true, |id| t.employee_id == id))
        {
            stats.record(task, today);
        }
        Ok(stats)
    }

    async fn deadline_candidates(
        &self,
        alert: DeadlineAlert,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let kind = alert.notification_type();
        let since = now - DeadlineAlert::dedup_window();

        let mut candidates: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| alert.matches(t, now))
            .filter(|t| {
                !state.notifications.values().any(|n| {
                    n.task_id == Some(t.id) && n.kind == kind && n.created_at >= since
                })
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|t| (t.deadline, t.id));
        Ok(candidates)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.read().map(|_| ())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create(
        &self,
        notification: NewNotification,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Notification> {
        let mut state = self.write()?;
        state.require_user(notification.user_id)?;

        let id = next_id(&mut state.last_notification_id);
        let notification = Notification {
            id,
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            task_id: notification
                .task_id
                .filter(|task_id| state.tasks.contains_key(task_id)),
            priority: notification.priority,
            is_read: false,
            read_at: None,
            created_at: at,
        };
        state.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        query: NotificationQuery,
    ) -> RepositoryResult<NotificationPage> {
        let state = self.read()?;
        let inbox: Vec<&Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .collect();
        let unread_count = inbox.iter().filter(|n| !n.is_read).count() as i64;

        let mut matching: Vec<Notification> = inbox
            .into_iter()
            .filter(|n| !query.unread_only || !n.is_read)
            .cloned()
            .collect();
        newest_first(&mut matching, |n| (n.created_at, n.id));

        Ok(NotificationPage {
            total: matching.len() as i64,
            notifications: query.pagination.slice(&matching),
            unread_count,
            page: query.pagination.page,
            limit: query.pagination.limit,
        })
    }

    async fn unread_count(&self, user_id: i64) -> RepositoryResult<i64> {
        let state = self.read()?;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(
        &self,
        id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Notification>> {
        let mut state = self.write()?;
        match state.notifications.get_mut(&id) {
            Some(n) if n.user_id == user_id => {
                n.apply_read(at);
                Ok(Some(n.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_all_read(&self, user_id: i64, at: DateTime<Utc>) -> RepositoryResult<u64> {
        let mut state = self.write()?;
        let mut changed = 0;
        for n in state
            .notifications
            .values_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.apply_read(at);
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, id: i64, user_id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state
            .notifications
            .get(&id)
            .is_some_and(|n| n.user_id == user_id)
        {
            state.notifications.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_all(&self, user_id: i64, read_only: bool) -> RepositoryResult<u64> {
        let mut state = self.write()?;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|_, n| !(n.user_id == user_id && (!read_only || n.is_read)));
        Ok((before - state.notifications.len()) as u64)
    }

    async fn purge_read_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let mut state = self.write()?;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|_, n| !(n.is_read && n.created_at < cutoff));
        Ok((before - state.notifications.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: CreateUser, at: DateTime<Utc>) -> RepositoryResult<User> {
        let mut state = self.write()?;
        if state.username_taken(&user.username, None) {
            return Err(RepositoryError::Conflict(format!(
                "Username {} is already taken",
                user.username
            )));
        }

        let id = next_id(&mut state.last_user_id);
        let user = User {
            id,
            full_name: user.full_name,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: at,
            updated_at: at,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self, role: Option<UserRole>) -> RepositoryResult<Vec<User>> {
        let state = self.read()?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn update(
        &self,
        id: i64,
        data: UpdateUser,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<User>> {
        let mut state = self.write()?;
        if let Some(username) = &data.username {
            if state.username_taken(username, Some(id)) {
                return Err(RepositoryError::Conflict(format!(
                    "Username {} is already taken",
                    username
                )));
            }
        }
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        user.apply_update(data, at);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if !state.users.contains_key(&id) {
            return Ok(false);
        }
        if state.tasks.values().any(|t| t.employee_id == id) {
            return Err(RepositoryError::Conflict(format!(
                "User {} still has assigned tasks",
                id
            )));
        }

        state.users.remove(&id);
        for task in state.tasks.values_mut() {
            if task.creator_id == Some(id) {
                task.creator_id = None;
            }
        }
        state.notifications.retain(|_, n| n.user_id != id);
        Ok(true)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        Ok(self.read()?.users.len() as i64)
    }
}
