/// User administration endpoints (managers only)
///
/// # Endpoints
///
/// - `POST /v1/users` - Create an account
/// - `GET /v1/users?role=` - List accounts
/// - `GET /v1/users/:id`
/// - `PUT /v1/users/:id` - Edit name, username, password or role
/// - `DELETE /v1/users/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery, CurrentUser},
    routes::{
        auth::{check_password_policy, hash_password},
        MessageResponse,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use taskdesk_shared::{
    auth::{authorization::require_manager, middleware::AuthContext},
    models::{
        task::TaskFilter,
        user::{CreateUser, UpdateUser, User, UserRole},
        Pagination,
    },
};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,

    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    pub password: String,

    pub role: UserRole,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: Option<String>,

    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: Option<String>,

    pub password: Option<String>,

    pub role: Option<UserRole>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub role: Option<UserRole>,
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("User {} not found", id))
}

async fn ensure_username_free(state: &AppState, username: &str, except: Option<i64>) -> ApiResult<()> {
    match state.users.find_by_username(username).await? {
        Some(existing) if Some(existing.id) != except => {
            Err(ApiError::Conflict(format!("Username {} is already taken", username)))
        }
        _ => Ok(()),
    }
}

/// Whether any task is still assigned to `user_id`
async fn has_assigned_tasks(state: &AppState, actor: &AuthContext, user_id: i64) -> ApiResult<bool> {
    let filter = TaskFilter {
        employee_id: Some(user_id),
        ..Default::default()
    };
    let page = state
        .lifecycle
        .list(actor, filter, Pagination::new(Some(1), Some(1)))
        .await?;
    Ok(page.total > 0)
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, ApiJson<User>)> {
    require_manager(&actor)?;
    req.validate()?;
    check_password_policy("password", &req.password)?;

    let username = req.username.trim().to_string();
    ensure_username_free(&state, &username, None).await?;

    let password_hash = hash_password(req.password).await?;
    let user = state
        .users
        .create(
            CreateUser {
                full_name: req.full_name.trim().to_string(),
                username,
                password_hash,
                role: req.role,
            },
            state.clock.now(),
        )
        .await?;

    info!(user_id = user.id, role = %user.role, actor_id = actor.user_id, "User created");
    Ok((StatusCode::CREATED, ApiJson(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<ApiJson<Vec<User>>> {
    require_manager(&actor)?;
    Ok(ApiJson(state.users.list(params.role).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ApiJson<User>> {
    require_manager(&actor)?;
    let user = state.users.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(ApiJson(user))
}

/// # Errors
///
/// - `400 Bad Request`: Managers changing their own role, weak password
/// - `409 Conflict`: Username taken, or promoting an employee who still has tasks
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<ApiJson<User>> {
    require_manager(&actor)?;
    req.validate()?;

    let existing = state.users.find_by_id(id).await?.ok_or_else(|| not_found(id))?;

    if let Some(role) = req.role {
        if id == actor.user_id && role != existing.role {
            return Err(ApiError::invalid("role", "You cannot change your own role"));
        }
        if role == UserRole::Manager
            && existing.role == UserRole::Employee
            && has_assigned_tasks(&state, &actor, id).await?
        {
            return Err(ApiError::Conflict(
                "Reassign this employee's tasks before making them a manager".to_string(),
            ));
        }
    }

    let username = req.username.map(|u| u.trim().to_string());
    if let Some(username) = username.as_deref() {
        ensure_username_free(&state, username, Some(id)).await?;
    }

    let password_hash = match req.password {
        Some(plain) => {
            check_password_policy("password", &plain)?;
            Some(hash_password(plain).await?)
        }
        None => None,
    };

    let user = state
        .users
        .update(
            id,
            UpdateUser {
                full_name: req.full_name.map(|n| n.trim().to_string()),
                username,
                password_hash,
                role: req.role,
            },
            state.clock.now(),
        )
        .await?
        .ok_or_else(|| not_found(id))?;

    info!(user_id = id, actor_id = actor.user_id, "User updated");
    Ok(ApiJson(user))
}

/// # Errors
///
/// - `400 Bad Request`: Deleting your own account
/// - `409 Conflict`: Tasks are still assigned to the user
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ApiJson<MessageResponse>> {
    require_manager(&actor)?;

    if id == actor.user_id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    if has_assigned_tasks(&state, &actor, id).await? {
        return Err(ApiError::Conflict(
            "Reassign or delete this user's tasks first".to_string(),
        ));
    }

    if !state.users.delete(id).await? {
        return Err(not_found(id));
    }

    info!(user_id = id, actor_id = actor.user_id, "User deleted");
    Ok(ApiJson(MessageResponse::new("User deleted")))
}
