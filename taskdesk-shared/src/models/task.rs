/// Task model and database operations
///
/// A task is a unit of work a manager assigns to an employee, typically a
/// device repair: it carries the device, the reported issue and, once work is
/// done, a work report.
///
/// # State Machine
///
/// ```text
/// open ⇄ in_progress ⇄ completed
///   └──────────┴───────────┴──→ cancelled (terminal, needs a reason)
/// ```
///
/// Entering `in_progress` records `actual_start_time` once; entering
/// `completed` overwrites `actual_end_time` every time.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id                  BIGSERIAL PRIMARY KEY,
///     title               VARCHAR(255) NOT NULL,
///     description         TEXT,
///     status              task_status NOT NULL DEFAULT 'open',
///     priority            task_priority NOT NULL DEFAULT 'medium',
///     task_date           DATE,
///     deadline            DATE,
///     device_model        VARCHAR(255),
///     serial_number       VARCHAR(255),
///     reported_issue      TEXT,
///     work_report         TEXT,
///     cancellation_reason TEXT,
///     employee_id         BIGINT NOT NULL REFERENCES users (id) ON DELETE RESTRICT,
///     creator_id          BIGINT REFERENCES users (id) ON DELETE SET NULL,
///     actual_start_time   TIMESTAMPTZ,
///     actual_end_time     TIMESTAMPTZ,
///     created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;

use super::deserialize_some;
use super::notification::NotificationType;
use super::Pagination;

macro_rules! task_columns {
    () => {
        "id, title, description, status, priority, task_date, deadline, device_model, \
         serial_number, reported_issue, work_report, cancellation_reason, employee_id, \
         creator_id, actual_start_time, actual_end_time, created_at, updated_at"
    };
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Human-readable label used in notification messages
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Open or in progress: work still outstanding
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Open | TaskStatus::InProgress)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskStatus::Open),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Urgent => "urgent",
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,

    /// Calendar date the work is planned for
    pub task_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,

    pub device_model: Option<String>,
    pub serial_number: Option<String>,
    pub reported_issue: Option<String>,

    /// Latest work report; replaced, never appended
    pub work_report: Option<String>,

    /// Set together with `status = cancelled`
    pub cancellation_reason: Option<String>,

    /// Assignee
    pub employee_id: i64,

    /// Manager who created the task (None once that account is deleted)
    pub creator_id: Option<i64>,

    /// First transition into `in_progress`
    pub actual_start_time: Option<DateTime<Utc>>,

    /// Most recent transition into `completed`
    pub actual_end_time: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Applies a status transition and its timestamp rules
    pub fn apply_status(&mut self, status: TaskStatus, at: DateTime<Utc>) {
        match status {
            TaskStatus::InProgress => {
                if self.actual_start_time.is_none() {
                    self.actual_start_time = Some(at);
                }
            }
            TaskStatus::Completed => self.actual_end_time = Some(at),
            TaskStatus::Open | TaskStatus::Cancelled => {}
        }
        self.status = status;
        self.updated_at = at;
    }

    /// Moves the task to `cancelled`, recording the reason
    pub fn apply_cancel(&mut self, reason: String, at: DateTime<Utc>) {
        self.status = TaskStatus::Cancelled;
        self.cancellation_reason = Some(reason);
        self.updated_at = at;
    }

    /// Applies the fields present in a patch
    pub fn apply_patch(&mut self, patch: TaskPatch, at: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(task_date) = patch.task_date {
            self.task_date = task_date;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(device_model) = patch.device_model {
            self.device_model = device_model;
        }
        if let Some(serial_number) = patch.serial_number {
            self.serial_number = serial_number;
        }
        if let Some(reported_issue) = patch.reported_issue {
            self.reported_issue = reported_issue;
        }
        self.updated_at = at;
    }

    /// Deadline has passed and work is still outstanding
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_active() && self.deadline.is_some_and(|d| d < today)
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub task_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub device_model: Option<String>,
    pub serial_number: Option<String>,
    pub reported_issue: Option<String>,
    pub employee_id: i64,

    /// Filled in from the acting user, never from the request body
    #[serde(skip)]
    pub creator_id: Option<i64>,
}

/// Partial update of a task's core fields
///
/// For nullable columns an absent key leaves the value untouched while an
/// explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub task_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub deadline: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub device_model: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub serial_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub reported_issue: Option<Option<String>>,
}

/// Filters for listing tasks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub employee_id: Option<i64>,
    pub creator_id: Option<i64>,

    /// Case-insensitive substring over title, description, device model and
    /// serial number
    pub search: Option<String>,

    /// Inclusive lower bound on `task_date`
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper bound on `task_date`
    pub date_to: Option<NaiveDate>,

    /// Only tasks past their deadline and still outstanding
    #[serde(default)]
    pub overdue: bool,
}

impl TaskFilter {
    fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Evaluates the filter against a single task
    ///
    /// Mirrors the SQL predicate built by [`push_task_filters`].
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if self.status.is_some_and(|s| task.status != s) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if self.employee_id.is_some_and(|id| task.employee_id != id) {
            return false;
        }
        if self.creator_id.is_some() && task.creator_id != self.creator_id {
            return false;
        }
        if let Some(from) = self.date_from {
            if !task.task_date.is_some_and(|d| d >= from) {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if !task.task_date.is_some_and(|d| d <= to) {
                return false;
            }
        }
        if self.overdue && !task.is_overdue(today) {
            return false;
        }
        if let Some(term) = self.search_term() {
            let needle = term.to_lowercase();
            let hit = |field: Option<&str>| {
                field.is_some_and(|value| value.to_lowercase().contains(&needle))
            };
            if !(hit(Some(&task.title))
                || hit(task.description.as_deref())
                || hit(task.device_model.as_deref())
                || hit(task.serial_number.as_deref()))
            {
                return false;
            }
        }
        true
    }
}

/// A page of tasks plus the total matching the same filter
#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl TaskPage {
    pub fn total_pages(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.total + i64::from(self.limit) - 1) / i64::from(self.limit)
        }
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TaskStats {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub overdue: i64,
}

impl TaskStats {
    /// Folds one task into the counters
    pub fn record(&mut self, task: &Task, today: NaiveDate) {
        self.total += 1;
        match task.status {
            TaskStatus::Open => self.open += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Cancelled => self.cancelled += 1,
        }
        if task.is_overdue(today) {
            self.overdue += 1;
        }
    }
}

/// Deadline thresholds scanned by the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineAlert {
    /// Deadline falls between today and 24 hours from now
    Approaching,

    /// Deadline is before today
    Overdue,
}

impl DeadlineAlert {
    /// How far back an earlier notification of the same kind suppresses a new one
    pub fn dedup_window() -> Duration {
        Duration::hours(24)
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            DeadlineAlert::Approaching => NotificationType::DeadlineApproaching,
            DeadlineAlert::Overdue => NotificationType::TaskOverdue,
        }
    }

    /// Inclusive date window `(from, to)` for approaching deadlines
    fn approaching_window(now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        (now.date_naive(), (now + Duration::hours(24)).date_naive())
    }

    /// Whether `task` crosses this threshold at `now`, ignoring de-duplication
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if !task.status.is_active() {
            return false;
        }
        let Some(deadline) = task.deadline else {
            return false;
        };
        match self {
            DeadlineAlert::Approaching => {
                let (from, to) = Self::approaching_window(now);
                deadline >= from && deadline <= to
            }
            DeadlineAlert::Overdue => deadline < now.date_naive(),
        }
    }
}

/// Escapes `%`, `_` and `\` for use inside an ILIKE pattern
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Appends the `WHERE` clause for `filter`
///
/// Used for both the page query and the count query so the two can never
/// disagree.
pub fn push_task_filters(
    query: &mut QueryBuilder<'static, Postgres>,
    filter: &TaskFilter,
    today: NaiveDate,
) {
    query.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        query.push(" AND priority = ").push_bind(priority);
    }
    if let Some(employee_id) = filter.employee_id {
        query.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(creator_id) = filter.creator_id {
        query.push(" AND creator_id = ").push_bind(creator_id);
    }
    if let Some(from) = filter.date_from {
        query.push(" AND task_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        query.push(" AND task_date <= ").push_bind(to);
    }
    if filter.overdue {
        query
            .push(" AND deadline < ")
            .push_bind(today)
            .push(" AND status IN ('open', 'in_progress')");
    }
    if let Some(term) = filter.search_term() {
        let pattern = format!("%{}%", escape_like(term));
        query.push(" AND (");
        for (i, column) in ["title", "description", "device_model", "serial_number"]
            .iter()
            .enumerate()
        {
            if i > 0 {
                query.push(" OR ");
            }
            query
                .push(*column)
                .push(" ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\'");
        }
        query.push(")");
    }
}

impl Task {
    /// Inserts a new task with status `open`
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if the assignee does not exist
    pub async fn create(pool: &PgPool, data: NewTask, at: DateTime<Utc>) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(concat!(
            "INSERT INTO tasks (title, description, priority, task_date, deadline, device_model, \
             serial_number, reported_issue, employee_id, creator_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             RETURNING ",
            task_columns!()
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.task_date)
        .bind(data.deadline)
        .bind(data.device_model)
        .bind(data.serial_number)
        .bind(data.reported_issue)
        .bind(data.employee_id)
        .bind(data.creator_id)
        .bind(at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(concat!("SELECT ", task_columns!(), " FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a page of tasks and the total matching the filter
    ///
    /// Both queries run in one transaction.
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        pagination: Pagination,
        today: NaiveDate,
    ) -> Result<TaskPage, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filters(&mut count_query, filter, today);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(concat!("SELECT ", task_columns!(), " FROM tasks"));
        push_task_filters(&mut page_query, filter, today);
        page_query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let tasks = page_query
            .build_query_as::<Task>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(TaskPage {
            tasks,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    /// Applies a core-field patch
    pub async fn update(
        pool: &PgPool,
        id: i64,
        patch: TaskPatch,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = ");
        query.push_bind(at);

        if let Some(title) = patch.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = patch.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(priority) = patch.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(task_date) = patch.task_date {
            query.push(", task_date = ").push_bind(task_date);
        }
        if let Some(deadline) = patch.deadline {
            query.push(", deadline = ").push_bind(deadline);
        }
        if let Some(device_model) = patch.device_model {
            query.push(", device_model = ").push_bind(device_model);
        }
        if let Some(serial_number) = patch.serial_number {
            query.push(", serial_number = ").push_bind(serial_number);
        }
        if let Some(reported_issue) = patch.reported_issue {
            query.push(", reported_issue = ").push_bind(reported_issue);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(concat!(" RETURNING ", task_columns!()));

        query.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Sets the status in a single statement, with the same timestamp rules
    /// as [`Task::apply_status`]
    ///
    /// Cancelled tasks are left untouched and yield `None`.
    pub async fn update_status(
        pool: &PgPool,
        id: i64,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(concat!(
            "UPDATE tasks SET \
                 status = $2, \
                 actual_start_time = CASE WHEN $2 = 'in_progress'::task_status \
                     THEN COALESCE(actual_start_time, $3) ELSE actual_start_time END, \
                 actual_end_time = CASE WHEN $2 = 'completed'::task_status \
                     THEN $3 ELSE actual_end_time END, \
                 updated_at = $3 \
             WHERE id = $1 AND status <> 'cancelled' \
             RETURNING ",
            task_columns!()
        ))
        .bind(id)
        .bind(status)
        .bind(at)
        .fetch_optional(pool)
        .await
    }

    /// Cancels a task, setting status and reason together
    ///
    /// Already-cancelled tasks yield `None`.
    pub async fn cancel(
        pool: &PgPool,
        id: i64,
        reason: String,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(concat!(
            "UPDATE tasks SET status = 'cancelled', cancellation_reason = $2, updated_at = $3 \
             WHERE id = $1 AND status <> 'cancelled' \
             RETURNING ",
            task_columns!()
        ))
        .bind(id)
        .bind(reason)
        .bind(at)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_work_report(
        pool: &PgPool,
        id: i64,
        report: String,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(concat!(
            "UPDATE tasks SET work_report = $2, updated_at = $3 WHERE id = $1 RETURNING ",
            task_columns!()
        ))
        .bind(id)
        .bind(report)
        .bind(at)
        .fetch_optional(pool)
        .await
    }

    pub async fn reassign(
        pool: &PgPool,
        id: i64,
        employee_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(concat!(
            "UPDATE tasks SET employee_id = $2, updated_at = $3 WHERE id = $1 RETURNING ",
            task_columns!()
        ))
        .bind(id)
        .bind(employee_id)
        .bind(at)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a task; its notifications keep their rows with `task_id` cleared
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts tasks per status, optionally for one assignee
    pub async fn stats(
        pool: &PgPool,
        employee_id: Option<i64>,
        today: NaiveDate,
    ) -> Result<TaskStats, sqlx::Error> {
        sqlx::query_as::<_, TaskStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'open') AS open,
                COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COUNT(*) FILTER (
                    WHERE deadline < $2 AND status IN ('open', 'in_progress')
                ) AS overdue
            FROM tasks
            WHERE $1::BIGINT IS NULL OR employee_id = $1
            "#,
        )
        .bind(employee_id)
        .bind(today)
        .fetch_one(pool)
        .await
    }

    /// Finds tasks crossing `alert` at `now` that have not been notified about
    /// within the de-duplication window
    pub async fn deadline_candidates(
        pool: &PgPool,
        alert: DeadlineAlert,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(concat!(
            "SELECT ",
            task_columns!(),
            " FROM tasks t WHERE t.status IN ('open', 'in_progress') AND t.deadline IS NOT NULL"
        ));

        match alert {
            DeadlineAlert::Approaching => {
                let (from, to) = DeadlineAlert::approaching_window(now);
                query
                    .push(" AND t.deadline >= ")
                    .push_bind(from)
                    .push(" AND t.deadline <= ")
                    .push_bind(to);
            }
            DeadlineAlert::Overdue => {
                query.push(" AND t.deadline < ").push_bind(now.date_naive());
            }
        }

        query
            .push(
                " AND NOT EXISTS (SELECT 1 FROM notifications n \
                 WHERE n.task_id = t.id AND n.notification_type = ",
            )
            .push_bind(alert.notification_type())
            .push(" AND n.created_at >= ")
            .push_bind(now - DeadlineAlert::dedup_window())
            .push(") ORDER BY t.deadline, t.id");

        query.build_query_as::<Task>().fetch_all(pool).await
    }
}
