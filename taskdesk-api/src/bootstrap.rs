//! First manager account
//!
//! A fresh database has no users and therefore nobody who can create them.
//! When `BOOTSTRAP_MANAGER_USERNAME` and `BOOTSTRAP_MANAGER_PASSWORD` are set
//! and the user table is empty, a manager account is created at startup.

use taskdesk_shared::auth::password::{hash_password, validate_password_strength};
use taskdesk_shared::clock::Clock;
use taskdesk_shared::models::user::{CreateUser, User, UserRole};
use taskdesk_shared::repository::UserRepository;
use tracing::info;

use crate::config::BootstrapManager;

/// Creates the bootstrap manager if no user exists yet
///
/// Returns the created account, or `None` when users already exist.
pub async fn ensure_manager(
    users: &dyn UserRepository,
    clock: &dyn Clock,
    manager: &BootstrapManager,
) -> anyhow::Result<Option<User>> {
    if users.count().await? > 0 {
        return Ok(None);
    }

    validate_password_strength(&manager.password)
        .map_err(|e| anyhow::anyhow!("BOOTSTRAP_MANAGER_PASSWORD: {}", e))?;

    let plain = manager.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain)).await??;

    let user = users
        .create(
            CreateUser {
                full_name: manager.full_name.clone(),
                username: manager.username.trim().to_string(),
                password_hash,
                role: UserRole::Manager,
            },
            clock.now(),
        )
        .await?;

    info!(user_id = user.id, username = %user.username, "Bootstrap manager created");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdesk_shared::clock::SystemClock;
    use taskdesk_shared::repository::InMemoryStore;

    fn manager() -> BootstrapManager {
        BootstrapManager {
            username: "admin".to_string(),
            password: "change-me".to_string(),
            full_name: "Administrator".to_string(),
        }
    }

    #[tokio::test]
    async fn test_creates_manager_once() {
        let store = InMemoryStore::new();

        let created = ensure_manager(&store, &SystemClock, &manager()).await.unwrap();
        let user = created.expect("manager created");
        assert_eq!(user.role, UserRole::Manager);
        assert_ne!(user.password_hash, "change-me");

        let again = ensure_manager(&store, &SystemClock, &manager()).await.unwrap();
        assert!(again.is_none());
        assert_eq!(UserRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_weak_password() {
        let store = InMemoryStore::new();
        let mut weak = manager();
        weak.password = "abc".to_string();

        assert!(ensure_manager(&store, &SystemClock, &weak).await.is_err());
    }
}
