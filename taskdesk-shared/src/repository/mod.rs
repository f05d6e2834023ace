//! Storage ports for users, tasks and notifications.
//!
//! Business logic depends only on these traits. [`PgStore`] implements them
//! over PostgreSQL, [`InMemoryStore`] over process memory for tests and demos;
//! both apply the same rules (foreign keys, read-state idempotence, deadline
//! de-duplication).

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::models::notification::{
    NewNotification, Notification, NotificationPage, NotificationQuery,
};
use crate::models::task::{
    DeadlineAlert, NewTask, Task, TaskFilter, TaskPage, TaskPatch, TaskStats, TaskStatus,
};
use crate::models::user::{CreateUser, UpdateUser, User, UserRole};
use crate::models::Pagination;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// A uniqueness or referential rule rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict("A record with the same unique value already exists".into());
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict("The record is still referenced by other records".into());
            }
        }
        Self::persistence(err)
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a task with status `open`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] when the assignee does not exist.
    async fn create(&self, task: NewTask, at: DateTime<Utc>) -> RepositoryResult<Task>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>>;

    /// Returns one page of matching tasks, newest first, plus the total.
    ///
    /// `today` anchors the overdue filter.
    async fn list(
        &self,
        filter: &TaskFilter,
        pagination: Pagination,
        today: NaiveDate,
    ) -> RepositoryResult<TaskPage>;

    /// Applies the fields present in `patch`. `None` when the task is missing.
    async fn update(
        &self,
        id: i64,
        patch: TaskPatch,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>>;

    /// Sets the status with its timestamp rules.
    ///
    /// `None` when the task is missing or cancelled.
    async fn update_status(
        &self,
        id: i64,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>>;

    /// Cancels with a reason. `None` when the task is missing or already cancelled.
    async fn cancel(
        &self,
        id: i64,
        reason: String,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>>;

    async fn set_work_report(
        &self,
        id: i64,
        report: String,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>>;

    async fn reassign(
        &self,
        id: i64,
        employee_id: i64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>>;

    /// Deletes a task. `false` when it did not exist.
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;

    /// Status counters, optionally limited to one assignee.
    async fn stats(&self, employee_id: Option<i64>, today: NaiveDate) -> RepositoryResult<TaskStats>;

    /// Tasks crossing `alert` at `now` with no notification of the matching
    /// type for that task in the last 24 hours.
    async fn deadline_candidates(
        &self,
        alert: DeadlineAlert,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Task>>;

    /// Checks the backing store is reachable.
    async fn ping(&self) -> RepositoryResult<()>;
}

/// Notification persistence contract.
///
/// Every operation keyed by a notification id also takes the owning user id;
/// another user's notification behaves as missing.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(
        &self,
        notification: NewNotification,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Notification>;

    async fn list_for_user(
        &self,
        user_id: i64,
        query: NotificationQuery,
    ) -> RepositoryResult<NotificationPage>;

    async fn unread_count(&self, user_id: i64) -> RepositoryResult<i64>;

    /// Marks read; repeat calls keep the first `read_at`.
    async fn mark_read(
        &self,
        id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Notification>>;

    /// Returns the number of notifications that changed.
    async fn mark_all_read(&self, user_id: i64, at: DateTime<Utc>) -> RepositoryResult<u64>;

    async fn delete(&self, id: i64, user_id: i64) -> RepositoryResult<bool>;

    /// Deletes the user's notifications, only read ones when `read_only`.
    async fn delete_all(&self, user_id: i64, read_only: bool) -> RepositoryResult<u64>;

    /// Deletes read notifications created before `cutoff`, across all users.
    async fn purge_read_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64>;
}

/// User persistence contract.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] when the username is taken.
    async fn create(&self, user: CreateUser, at: DateTime<Utc>) -> RepositoryResult<User>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    async fn list(&self, role: Option<UserRole>) -> RepositoryResult<Vec<User>>;

    async fn update(
        &self,
        id: i64,
        data: UpdateUser,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<User>>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] while tasks are assigned to the user.
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;

    async fn count(&self) -> RepositoryResult<i64>;
}
