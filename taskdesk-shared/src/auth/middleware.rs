/// Request authentication
///
/// Turns a bearer token into an [`AuthContext`]. The token only identifies the
/// user; role and display name are loaded from the user store on every call,
/// so a demoted manager loses access with their next request.
///
/// Both the REST middleware and the WebSocket `authenticate` event go through
/// [`authenticate_token`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::{User, UserRole};
use crate::repository::{RepositoryError, UserRepository};

/// The acting user, attached to request extensions after authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: UserRole,
    pub username: String,

    /// Used as the actor name in notification messages
    pub full_name: String,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role == UserRole::Manager
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but its user no longer exists
    #[error("User no longer exists")]
    UnknownUser,

    /// User lookup failed
    #[error("User lookup failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Validates an access token and loads the acting user
///
/// # Errors
///
/// - `AuthError::InvalidToken` for bad, expired or refresh tokens
/// - `AuthError::UnknownUser` if the user was deleted after the token was issued
/// - `AuthError::Repository` if the lookup itself fails
pub async fn authenticate_token(
    users: &dyn UserRepository,
    token: &str,
    secret: &str,
) -> Result<AuthContext, AuthError> {
    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let user_id = claims
        .user_id()
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    debug!(user_id, role = %user.role, "Authenticated request");
    Ok(AuthContext::from_user(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use crate::models::user::CreateUser;
    use crate::repository::InMemoryStore;
    use chrono::Utc;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(matches!(
            extract_bearer_token(None),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Basic abc")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(extract_bearer_token(Some("Bearer ")).is_err());
    }

    #[tokio::test]
    async fn test_authenticate_token_loads_current_role() {
        let store = InMemoryStore::new();
        let user = UserRepository::create(
            &store,
            CreateUser {
                full_name: "Maria Manager".to_string(),
                username: "maria".to_string(),
                password_hash: "x".to_string(),
                role: UserRole::Manager,
            },
            Utc::now(),
        )
        .await
        .unwrap();
        let token = create_token(&Claims::new(user.id, TokenType::Access), SECRET).unwrap();

        let ctx = authenticate_token(&store, &token, SECRET).await.unwrap();
        assert!(ctx.is_manager());
        assert_eq!(ctx.full_name, "Maria Manager");

        UserRepository::update(
            &store,
            user.id,
            crate::models::user::UpdateUser {
                role: Some(UserRole::Employee),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        let ctx = authenticate_token(&store, &token, SECRET).await.unwrap();
        assert!(!ctx.is_manager());
    }

    #[tokio::test]
    async fn test_authenticate_token_rejects_refresh_and_unknown_users() {
        let store = InMemoryStore::new();

        let refresh = create_token(&Claims::new(1, TokenType::Refresh), SECRET).unwrap();
        assert!(matches!(
            authenticate_token(&store, &refresh, SECRET).await,
            Err(AuthError::InvalidToken(_))
        ));

        let ghost = create_token(&Claims::new(99, TokenType::Access), SECRET).unwrap();
        assert!(matches!(
            authenticate_token(&store, &ghost, SECRET).await,
            Err(AuthError::UnknownUser)
        ));
    }
}
