//! PostgreSQL adapter delegating to the model queries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use super::{
    NotificationRepository, RepositoryResult, TaskRepository, UserRepository,
};
use crate::db::pool::health_check;
use crate::models::notification::{
    NewNotification, Notification, NotificationPage, NotificationQuery,
};
use crate::models::task::{
    DeadlineAlert, NewTask, Task, TaskFilter, TaskPage, TaskPatch, TaskStats, TaskStatus,
};
use crate::models::user::{CreateUser, UpdateUser, User, UserRole};
use crate::models::Pagination;

/// Repository implementation backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn create(&self, task: NewTask, at: DateTime<Utc>) -> RepositoryResult<Task> {
        Ok(Task::create(&self.pool, task, at).await?)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list(
        &self,
        filter: &TaskFilter,
        pagination: Pagination,
        today: NaiveDate,
    ) -> RepositoryResult<TaskPage> {
        Ok(Task::list(&self.pool, filter, pagination, today).await?)
    }

    async fn update(
        &self,
        id: i64,
        patch: TaskPatch,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, patch, at).await?)
    }

    async fn update_status(
        &self,
        id: i64,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        Ok(Task::update_status(&self.pool, id, status, at).await?)
    }

    async fn cancel(
        &self,
        id: i64,
        reason: String,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        Ok(Task::cancel(&self.pool, id, reason, at).await?)
    }

    async fn set_work_report(
        &self,
        id: i64,
        report: String,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        Ok(Task::set_work_report(&self.pool, id, report, at).await?)
    }

    async fn reassign(
        &self,
        id: i64,
        employee_id: i64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Task>> {
        Ok(Task::reassign(&self.pool, id, employee_id, at).await?)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn stats(&self, employee_id: Option<i64>, today: NaiveDate) -> RepositoryResult<TaskStats> {
        Ok(Task::stats(&self.pool, employee_id, today).await?)
    }

    async fn deadline_candidates(
        &self,
        alert: DeadlineAlert,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Task>> {
        Ok(Task::deadline_candidates(&self.pool, alert, now).await?)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn create(
        &self,
        notification: NewNotification,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Notification> {
        Ok(Notification::create(&self.pool, notification, at).await?)
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        query: NotificationQuery,
    ) -> RepositoryResult<NotificationPage> {
        Ok(Notification::list_for_user(&self.pool, user_id, query).await?)
    }

    async fn unread_count(&self, user_id: i64) -> RepositoryResult<i64> {
        Ok(Notification::unread_count(&self.pool, user_id).await?)
    }

    async fn mark_read(
        &self,
        id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<Notification>> {
        Ok(Notification::mark_read(&self.pool, id, user_id, at).await?)
    }

    async fn mark_all_read(&self, user_id: i64, at: DateTime<Utc>) -> RepositoryResult<u64> {
        Ok(Notification::mark_all_read(&self.pool, user_id, at).await?)
    }

    async fn delete(&self, id: i64, user_id: i64) -> RepositoryResult<bool> {
        Ok(Notification::delete(&self.pool, id, user_id).await?)
    }

    async fn delete_all(&self, user_id: i64, read_only: bool) -> RepositoryResult<u64> {
        Ok(Notification::delete_all(&self.pool, user_id, read_only).await?)
    }

    async fn purge_read_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        Ok(Notification::purge_read_before(&self.pool, cutoff).await?)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: CreateUser, at: DateTime<Utc>) -> RepositoryResult<User> {
        Ok(User::create(&self.pool, user, at).await?)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn list(&self, role: Option<UserRole>) -> RepositoryResult<Vec<User>> {
        Ok(User::list(&self.pool, role).await?)
    }

    async fn update(
        &self,
        id: i64,
        data: UpdateUser,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<User>> {
        Ok(User::update(&self.pool, id, data, at).await?)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        Ok(User::count(&self.pool).await?)
    }
}
