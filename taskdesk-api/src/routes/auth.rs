/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
/// - `GET /v1/auth/me` - Current user
/// - `PUT /v1/auth/password` - Change own password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, CurrentUser},
    routes::MessageResponse,
};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::{jwt, password},
    models::user::{UpdateUser, User},
};
use tracing::{info, warn};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    pub new_password: String,
}

/// Hashes off the async runtime; Argon2id is deliberately slow
pub(crate) async fn hash_password(plain: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn verify_password(plain: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Applies the password policy, reporting failures against `field`
pub(crate) fn check_password_policy(field: &str, plain: &str) -> ApiResult<()> {
    password::validate_password_strength(plain).map_err(|message| ApiError::invalid(field, message))
}

/// Login endpoint
///
/// ```text
/// POST /v1/auth/login
/// { "username": "maria", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing username or password
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiJson<LoginResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(req.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(invalid());
    }

    let access_token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Access),
        state.jwt_secret(),
    )?;
    let refresh_token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Refresh),
        state.jwt_secret(),
    )?;

    info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(ApiJson(LoginResponse {
        access_token,
        refresh_token,
        user,
    }))
}

/// Token refresh endpoint
///
/// The user must still exist; deleting an account invalidates its refresh
/// tokens.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<ApiJson<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;
    let user_id = claims.user_id()?;

    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(ApiError::Unauthorized("User no longer exists".to_string()));
    }

    let access_token = jwt::create_token(
        &jwt::Claims::new(user_id, jwt::TokenType::Access),
        state.jwt_secret(),
    )?;

    Ok(ApiJson(RefreshResponse { access_token }))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<ApiJson<User>> {
    let user = state
        .users
        .find_by_id(actor.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok(ApiJson(user))
}

/// Changes the caller's own password
///
/// # Errors
///
/// - `400 Bad Request`: Wrong current password or weak new password
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<ApiJson<MessageResponse>> {
    req.validate()?;
    check_password_policy("newPassword", &req.new_password)?;

    let user = state
        .users
        .find_by_id(actor.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    if !verify_password(req.current_password, user.password_hash).await? {
        return Err(ApiError::invalid(
            "currentPassword",
            "Current password is incorrect",
        ));
    }

    let password_hash = hash_password(req.new_password).await?;
    state
        .users
        .update(
            actor.user_id,
            UpdateUser {
                password_hash: Some(password_hash),
                ..Default::default()
            },
            state.clock.now(),
        )
        .await?;

    info!(user_id = actor.user_id, "Password changed");
    Ok(ApiJson(MessageResponse::new("Password updated")))
}
