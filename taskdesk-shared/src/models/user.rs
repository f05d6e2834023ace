/// User model and database operations
///
/// Users are either managers, who create and assign work, or employees, who
/// carry it out. Passwords are stored as Argon2id hashes and never serialized.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('manager', 'employee');
///
/// CREATE TABLE users (
///     id            BIGSERIAL PRIMARY KEY,
///     full_name     VARCHAR(255) NOT NULL,
///     username      VARCHAR(100) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role          user_role NOT NULL DEFAULT 'employee',
///     created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;

const USER_COLUMNS: &str = "id, full_name, username, password_hash, role, created_at, updated_at";

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Creates, edits, assigns and cancels tasks; administers users
    Manager,

    /// Works on tasks assigned to them
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Manager => "manager",
            UserRole::Employee => "employee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(UserRole::Manager),
            "employee" => Ok(UserRole::Employee),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Display name used in notification messages
    pub full_name: String,

    /// Login name, unique across all users
    pub username: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub full_name: String,
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub role: UserRole,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

impl User {
    pub fn is_manager(&self) -> bool {
        self.role == UserRole::Manager
    }

    /// Applies an update in place, stamping `updated_at`
    pub fn apply_update(&mut self, data: UpdateUser, at: DateTime<Utc>) {
        if let Some(full_name) = data.full_name {
            self.full_name = full_name;
        }
        if let Some(username) = data.username {
            self.username = username;
        }
        if let Some(password_hash) = data.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(role) = data.role {
            self.role = role;
        }
        self.updated_at = at;
    }

    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the username already exists (unique constraint
    /// violation) or the database connection fails
    pub async fn create(
        pool: &PgPool,
        data: CreateUser,
        at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, username, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.full_name)
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(at)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username (exact match)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Lists users ordered by full name, optionally restricted to one role
    pub async fn list(pool: &PgPool, role: Option<UserRole>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE $1::user_role IS NULL OR role = $1
            ORDER BY full_name, id
            "#
        ))
        .bind(role)
        .fetch_all(pool)
        .await
    }

    /// Updates an existing user
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the new username is taken or the database
    /// connection fails
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = ");
        query.push_bind(at);

        if let Some(full_name) = data.full_name {
            query.push(", full_name = ").push_bind(full_name);
        }
        if let Some(username) = data.username {
            query.push(", username = ").push_bind(username);
        }
        if let Some(password_hash) = data.password_hash {
            query.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(role) = data.role {
            query.push(", role = ").push_bind(role);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" RETURNING ").push(USER_COLUMNS);

        query.build_query_as::<User>().fetch_optional(pool).await
    }

    /// Deletes a user
    ///
    /// Fails with a foreign key violation while tasks are still assigned to
    /// the user.
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> User {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        User {
            id: 1,
            full_name: "Ana Petrova".to_string(),
            username: "ana".to_string(),
            password_hash: "$argon2id$v=19$m=65536,t=3,p=4$salt$hash".to_string(),
            role: UserRole::Employee,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("manager".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert_eq!("employee".parse::<UserRole>().unwrap(), UserRole::Employee);
        assert!("admin".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Manager.to_string(), "manager");
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "employee");
        assert_eq!(json["username"], "ana");
    }

    #[test]
    fn test_apply_update() {
        let mut user = sample_user();
        let later = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        user.apply_update(
            UpdateUser {
                role: Some(UserRole::Manager),
                ..Default::default()
            },
            later,
        );

        assert!(user.is_manager());
        assert_eq!(user.username, "ana");
        assert_eq!(user.updated_at, later);
    }
}
