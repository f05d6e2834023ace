/// Common test utilities for integration tests
///
/// Builds the full router over an [`InMemoryStore`] and a [`ManualClock`],
/// seeds one manager and two employees, and wraps request plumbing.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tower::Service as _;

use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskdesk_shared::auth::jwt::{create_token, Claims, TokenType};
use taskdesk_shared::auth::password::hash_password;
use taskdesk_shared::clock::ManualClock;
use taskdesk_shared::models::user::{CreateUser, User, UserRole};
use taskdesk_shared::repository::{InMemoryStore, UserRepository};

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "secret1";

/// Argon2 is slow; hash the shared test password once per test binary
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        bootstrap: None,
        sweep_enabled: false,
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub manager: User,
    pub alice: User,
    pub bob: User,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        ));

        let mut seeded = Vec::new();
        for (full_name, username, role) in [
            ("Maria Manager", "maria", UserRole::Manager),
            ("Alice Tech", "alice", UserRole::Employee),
            ("Bob Tech", "bob", UserRole::Employee),
        ] {
            let user = UserRepository::create(
                store.as_ref(),
                CreateUser {
                    full_name: full_name.to_string(),
                    username: username.to_string(),
                    password_hash: password_hash(),
                    role,
                },
                Utc::now(),
            )
            .await
            .unwrap();
            seeded.push(user);
        }
        let bob = seeded.pop().unwrap();
        let alice = seeded.pop().unwrap();
        let manager = seeded.pop().unwrap();

        let state = AppState::new(store.clone(), clock.clone(), test_config());
        let app = build_router(state.clone());

        Self {
            app,
            state,
            store,
            clock,
            manager,
            alice,
            bob,
        }
    }

    /// Access token for `user`
    pub fn token(&self, user: &User) -> String {
        create_token(&Claims::new(user.id, TokenType::Access), SECRET).unwrap()
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for an empty body)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    /// Sends a request authenticated as `user`
    pub async fn as_user(
        &self,
        user: &User,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = self.token(user);
        self.send(method, uri, Some(&token), body).await
    }

    /// Creates a task assigned to `employee` as the manager; returns its id
    pub async fn create_task(&self, title: &str, employee: &User, extra: Value) -> i64 {
        let mut body = serde_json::json!({ "title": title, "employeeId": employee.id });
        if let (Some(target), Some(fields)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        let (status, task) = self
            .as_user(&self.manager, "POST", "/v1/tasks", Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", task);
        task["id"].as_i64().unwrap()
    }
}
