/// Notification inbox endpoints
///
/// Every query is scoped to the caller; another user's notification id
/// behaves exactly like a missing one.
///
/// # Endpoints
///
/// - `GET /v1/notifications?page&limit&unreadOnly`
/// - `GET /v1/notifications/unread-count`
/// - `PATCH /v1/notifications/:id/read`
/// - `PATCH /v1/notifications/mark-all-read`
/// - `DELETE /v1/notifications/:id`
/// - `DELETE /v1/notifications?readOnly=true|false`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery, CurrentUser},
};
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use taskdesk_shared::models::{
    notification::{Notification, NotificationPage, NotificationQuery},
    Pagination,
};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllParams {
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Notification {} not found", id))
}

/// Newest first, with the inbox-wide unread count
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<ApiJson<NotificationPage>> {
    let query = NotificationQuery {
        unread_only: params.unread_only,
        pagination: Pagination::new(params.page, params.limit),
    };
    Ok(ApiJson(
        state.notifications.list_for_user(actor.user_id, query).await?,
    ))
}

pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<ApiJson<CountResponse>> {
    let count = state.notifications.unread_count(actor.user_id).await?;
    Ok(ApiJson(CountResponse { count }))
}

/// Idempotent: marking twice keeps the first `read_at`
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ApiJson<Notification>> {
    let notification = state
        .notifications
        .mark_read(id, actor.user_id, state.clock.now())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiJson(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<ApiJson<UpdatedResponse>> {
    let updated = state
        .notifications
        .mark_all_read(actor.user_id, state.clock.now())
        .await?;
    debug!(user_id = actor.user_id, updated, "Marked all notifications read");
    Ok(ApiJson(UpdatedResponse { updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ApiJson<DeletedResponse>> {
    if !state.notifications.delete(id, actor.user_id).await? {
        return Err(not_found(id));
    }
    Ok(ApiJson(DeletedResponse { deleted: 1 }))
}

/// Bulk delete; `readOnly=true` keeps unread notifications
pub async fn delete_all_notifications(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(params): ApiQuery<DeleteAllParams>,
) -> ApiResult<ApiJson<DeletedResponse>> {
    let deleted = state
        .notifications
        .delete_all(actor.user_id, params.read_only)
        .await?;
    debug!(user_id = actor.user_id, deleted, read_only = params.read_only, "Cleared notifications");
    Ok(ApiJson(DeletedResponse { deleted }))
}
