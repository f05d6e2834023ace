/// Task lifecycle engine
///
/// Every task mutation goes through [`TaskLifecycle`]. Each operation runs its
/// checks in a fixed order:
///
/// 1. input validation (no storage access)
/// 2. role check for manager-only operations
/// 3. task lookup (`TaskNotFound`)
/// 4. ownership check for self-service operations
/// 5. the write, then notifications
///
/// Notifications are derived after the write has succeeded and never fail the
/// operation. Nobody is notified about their own action.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_shared::auth::middleware::AuthContext;
/// use taskdesk_shared::clock::SystemClock;
/// use taskdesk_shared::lifecycle::TaskLifecycle;
/// use taskdesk_shared::models::task::TaskStatus;
/// use taskdesk_shared::notify::{NoopPublisher, NotificationDispatcher};
/// use taskdesk_shared::repository::InMemoryStore;
///
/// # async fn example(actor: AuthContext) -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(InMemoryStore::new());
/// let clock = Arc::new(SystemClock);
/// let dispatcher = NotificationDispatcher::new(store.clone(), Arc::new(NoopPublisher), clock.clone());
/// let lifecycle = TaskLifecycle::new(store.clone(), store, dispatcher, clock);
///
/// let task = lifecycle.update_status(&actor, 1, TaskStatus::InProgress).await?;
/// assert!(task.actual_start_time.is_some());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use tracing::info;

use crate::auth::authorization::{require_manager, require_task_access, AuthzError};
use crate::auth::middleware::AuthContext;
use crate::clock::Clock;
use crate::models::task::{
    NewTask, Task, TaskFilter, TaskPage, TaskPatch, TaskStats, TaskStatus,
};
use crate::models::user::UserRole;
use crate::models::Pagination;
use crate::notify::NotificationDispatcher;
use crate::repository::{RepositoryError, TaskRepository, UserRepository};

/// Longest accepted task title, in characters
pub const MAX_TITLE_LENGTH: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Request is malformed; nothing was read or written
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Task {0} not found")]
    TaskNotFound(i64),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// Request is well-formed but the task's state does not allow it
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Trims `value` and rejects it if blank
fn required_text(field: &'static str, value: &str) -> LifecycleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::validation(field, format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn validate_title(title: &str) -> LifecycleResult<String> {
    let title = required_text("title", title)?;
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(LifecycleError::validation(
            "title",
            format!("title must be at most {} characters", MAX_TITLE_LENGTH),
        ));
    }
    Ok(title)
}

/// `candidate`, unless it is the actor
fn other_than(actor: &AuthContext, candidate: Option<i64>) -> Option<i64> {
    candidate.filter(|id| *id != actor.user_id)
}

pub struct TaskLifecycle {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl TaskLifecycle {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            users,
            dispatcher,
            clock,
        }
    }

    async fn load(&self, id: i64) -> LifecycleResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::TaskNotFound(id))
    }

    /// Explains a conditional write that matched no row: the task is either
    /// gone or was cancelled in the meantime
    async fn write_missed(&self, id: i64, conflict: &str) -> LifecycleError {
        match self.tasks.find_by_id(id).await {
            Ok(None) => LifecycleError::TaskNotFound(id),
            Ok(Some(_)) => LifecycleError::Conflict(conflict.to_string()),
            Err(e) => e.into(),
        }
    }

    /// Ensures `employee_id` names an existing employee account
    async fn require_employee(&self, employee_id: i64) -> LifecycleResult<()> {
        match self.users.find_by_id(employee_id).await? {
            Some(user) if user.role == UserRole::Employee => Ok(()),
            Some(_) => Err(LifecycleError::validation(
                "employeeId",
                "Tasks can only be assigned to employees",
            )),
            None => Err(LifecycleError::validation(
                "employeeId",
                format!("Employee {} does not exist", employee_id),
            )),
        }
    }

    /// Creates a task assigned to an employee, with the actor as creator
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank title or an assignee that is not an employee
    /// - `Forbidden` unless the actor is a manager
    pub async fn create(&self, actor: &AuthContext, mut input: NewTask) -> LifecycleResult<Task> {
        input.title = validate_title(&input.title)?;
        require_manager(actor)?;
        self.require_employee(input.employee_id).await?;

        input.creator_id = Some(actor.user_id);
        let task = self.tasks.create(input, self.clock.now()).await?;

        info!(
            task_id = task.id,
            employee_id = task.employee_id,
            actor_id = actor.user_id,
            "Task created"
        );

        if other_than(actor, Some(task.employee_id)).is_some() {
            self.dispatcher.task_assigned(&task, &actor.full_name).await;
        }

        Ok(task)
    }

    /// Fetches a task the actor may see
    pub async fn get(&self, actor: &AuthContext, id: i64) -> LifecycleResult<Task> {
        let task = self.load(id).await?;
        require_task_access(actor, &task)?;
        Ok(task)
    }

    /// Lists tasks; employees only ever see their own
    pub async fn list(
        &self,
        actor: &AuthContext,
        mut filter: TaskFilter,
        pagination: Pagination,
    ) -> LifecycleResult<TaskPage> {
        if !actor.is_manager() {
            filter.employee_id = Some(actor.user_id);
        }
        Ok(self
            .tasks
            .list(&filter, pagination, self.clock.today())
            .await?)
    }

    /// Edits core fields (manager only)
    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i64,
        mut patch: TaskPatch,
    ) -> LifecycleResult<Task> {
        if let Some(title) = patch.title.as_deref() {
            patch.title = Some(validate_title(title)?);
        }
        require_manager(actor)?;

        let task = self
            .tasks
            .update(id, patch, self.clock.now())
            .await?
            .ok_or(LifecycleError::TaskNotFound(id))?;

        info!(task_id = id, actor_id = actor.user_id, "Task updated");
        Ok(task)
    }

    /// Deletes a task (manager only)
    pub async fn delete(&self, actor: &AuthContext, id: i64) -> LifecycleResult<()> {
        require_manager(actor)?;

        if !self.tasks.delete(id).await? {
            return Err(LifecycleError::TaskNotFound(id));
        }

        info!(task_id = id, actor_id = actor.user_id, "Task deleted");
        Ok(())
    }

    /// Moves a task between open, in progress and completed
    ///
    /// # Errors
    ///
    /// - `Validation` when asked to move to `cancelled` (use [`Self::cancel`])
    /// - `Forbidden` when an employee targets someone else's task
    /// - `Conflict` when the task is cancelled
    pub async fn update_status(
        &self,
        actor: &AuthContext,
        id: i64,
        status: TaskStatus,
    ) -> LifecycleResult<Task> {
        if status == TaskStatus::Cancelled {
            return Err(LifecycleError::validation(
                "status",
                "Cancelling a task requires a reason; use the cancel operation",
            ));
        }

        let task = self.load(id).await?;
        require_task_access(actor, &task)?;

        if task.status == TaskStatus::Cancelled {
            return Err(LifecycleError::Conflict(
                "Cancelled tasks cannot change status".to_string(),
            ));
        }

        let previous = task.status;
        let updated = match self.tasks.update_status(id, status, self.clock.now()).await? {
            Some(task) => task,
            None => {
                return Err(self
                    .write_missed(id, "Cancelled tasks cannot change status")
                    .await)
            }
        };

        info!(
            task_id = id,
            from = %previous,
            to = %status,
            actor_id = actor.user_id,
            "Task status changed"
        );

        if previous != status {
            if let Some(creator) = other_than(actor, updated.creator_id) {
                if status == TaskStatus::Completed {
                    self.dispatcher
                        .task_completed(&updated, creator, &actor.full_name)
                        .await;
                } else {
                    self.dispatcher
                        .status_changed(&updated, creator, previous, &actor.full_name)
                        .await;
                }
            }
        }

        Ok(updated)
    }

    /// Cancels a task with a reason (manager only)
    pub async fn cancel(
        &self,
        actor: &AuthContext,
        id: i64,
        reason: &str,
    ) -> LifecycleResult<Task> {
        let reason = required_text("cancellationReason", reason)?;
        require_manager(actor)?;

        let task = self.load(id).await?;
        if task.status == TaskStatus::Cancelled {
            return Err(LifecycleError::Conflict("Task is already cancelled".to_string()));
        }

        let cancelled = match self.tasks.cancel(id, reason, self.clock.now()).await? {
            Some(task) => task,
            None => return Err(self.write_missed(id, "Task is already cancelled").await),
        };

        info!(task_id = id, actor_id = actor.user_id, "Task cancelled");
        Ok(cancelled)
    }

    /// Replaces the work report (manager or assignee)
    pub async fn attach_work_report(
        &self,
        actor: &AuthContext,
        id: i64,
        report: &str,
    ) -> LifecycleResult<Task> {
        let report = required_text("workReport", report)?;

        let task = self.load(id).await?;
        require_task_access(actor, &task)?;

        let updated = self
            .tasks
            .set_work_report(id, report, self.clock.now())
            .await?
            .ok_or(LifecycleError::TaskNotFound(id))?;

        info!(task_id = id, actor_id = actor.user_id, "Work report attached");

        if let Some(creator) = other_than(actor, updated.creator_id) {
            self.dispatcher
                .work_report_added(&updated, creator, &actor.full_name)
                .await;
        }

        Ok(updated)
    }

    /// Moves a task to another employee (manager only)
    ///
    /// Status and lifecycle timestamps are left as they are. Reassigning to
    /// the current assignee is a no-op.
    pub async fn reassign(
        &self,
        actor: &AuthContext,
        id: i64,
        employee_id: i64,
    ) -> LifecycleResult<Task> {
        require_manager(actor)?;

        let task = self.load(id).await?;
        self.require_employee(employee_id).await?;

        if task.employee_id == employee_id {
            return Ok(task);
        }

        let previous_employee = task.employee_id;
        let updated = self
            .tasks
            .reassign(id, employee_id, self.clock.now())
            .await?
            .ok_or(LifecycleError::TaskNotFound(id))?;

        info!(
            task_id = id,
            from = previous_employee,
            to = employee_id,
            actor_id = actor.user_id,
            "Task reassigned"
        );

        if let Some(previous) = other_than(actor, Some(previous_employee)) {
            self.dispatcher
                .task_reassigned_away(&updated, previous, &actor.full_name)
                .await;
        }
        if other_than(actor, Some(updated.employee_id)).is_some() {
            self.dispatcher
                .task_reassigned_to(&updated, &actor.full_name)
                .await;
        }

        Ok(updated)
    }

    /// Dashboard counters; employees see their own tasks only
    pub async fn stats(&self, actor: &AuthContext) -> LifecycleResult<TaskStats> {
        let scope = (!actor.is_manager()).then_some(actor.user_id);
        Ok(self.tasks.stats(scope, self.clock.today()).await?)
    }
}
