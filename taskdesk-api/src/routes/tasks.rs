/// Task endpoints
///
/// Every handler delegates to
/// [`TaskLifecycle`](taskdesk_shared::lifecycle::TaskLifecycle), which owns
/// validation, permission checks and notifications.
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create (manager)
/// - `GET /v1/tasks` - List with filters and pagination
/// - `GET /v1/tasks/:id` - Fetch one
/// - `PUT /v1/tasks/:id` - Edit core fields (manager)
/// - `DELETE /v1/tasks/:id` - Delete (manager)
/// - `PATCH /v1/tasks/:id/status` - Move between open / in_progress / completed
/// - `PATCH /v1/tasks/:id/cancel` - Cancel with a reason (manager)
/// - `PATCH /v1/tasks/:id/report` - Attach a work report
/// - `PATCH /v1/tasks/:id/reassign` - Move to another employee (manager)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiQuery, CurrentUser},
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::models::{
    task::{NewTask, Task, TaskFilter, TaskPage, TaskPatch, TaskStatus},
    Pagination,
};

/// `page` and `limit` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<PageParams> for Pagination {
    fn from(params: PageParams) -> Self {
        Pagination::new(params.page, params.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub pagination: PaginationInfo,
}

impl From<TaskPage> for TaskListResponse {
    fn from(page: TaskPage) -> Self {
        let pagination = PaginationInfo {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
        };
        Self {
            tasks: page.tasks,
            pagination,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default)]
    pub cancellation_reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub work_report: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignRequest {
    pub employee_id: i64,
}

/// Creates a task; responds `201 Created`
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(input): ApiJson<NewTask>,
) -> ApiResult<(StatusCode, ApiJson<Task>)> {
    let task = state.lifecycle.create(&actor, input).await?;
    Ok((StatusCode::CREATED, ApiJson(task)))
}

/// Lists tasks
///
/// Query parameters: `status, priority, employeeId, creatorId, search,
/// dateFrom, dateTo, overdue, page, limit`. Employees only ever see their
/// own tasks regardless of `employeeId`.
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(filter): ApiQuery<TaskFilter>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<ApiJson<TaskListResponse>> {
    let page = state.lifecycle.list(&actor, filter, page.into()).await?;
    Ok(ApiJson(page.into()))
}

pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ApiJson<Task>> {
    Ok(ApiJson(state.lifecycle.get(&actor, id).await?))
}

/// Partial update: absent keys are kept, `null` clears nullable fields
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<ApiJson<Task>> {
    Ok(ApiJson(state.lifecycle.update(&actor, id, patch).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ApiJson<MessageResponse>> {
    state.lifecycle.delete(&actor, id).await?;
    Ok(ApiJson(MessageResponse::new("Task deleted")))
}

/// # Errors
///
/// - `400 Bad Request`: Target status is `cancelled`
/// - `403 Forbidden`: Employee acting on someone else's task
/// - `409 Conflict`: Task is cancelled
pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<ApiJson<Task>> {
    Ok(ApiJson(
        state.lifecycle.update_status(&actor, id, req.status).await?,
    ))
}

pub async fn cancel_task(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<CancelRequest>,
) -> ApiResult<ApiJson<Task>> {
    Ok(ApiJson(
        state
            .lifecycle
            .cancel(&actor, id, &req.cancellation_reason)
            .await?,
    ))
}

pub async fn attach_report(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<ApiJson<Task>> {
    Ok(ApiJson(
        state
            .lifecycle
            .attach_work_report(&actor, id, &req.work_report)
            .await?,
    ))
}

pub async fn reassign_task(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<ReassignRequest>,
) -> ApiResult<ApiJson<Task>> {
    Ok(ApiJson(
        state.lifecycle.reassign(&actor, id, req.employee_id).await?,
    ))
}
