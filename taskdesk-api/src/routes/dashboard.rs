/// Dashboard counters
///
/// `GET /v1/dashboard/stats` returns `{total, open, in_progress, completed,
/// cancelled, overdue}`. Managers see every task, employees their own.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, CurrentUser},
};
use axum::extract::State;
use taskdesk_shared::models::task::TaskStats;

pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<ApiJson<TaskStats>> {
    Ok(ApiJson(state.lifecycle.stats(&actor).await?))
}
