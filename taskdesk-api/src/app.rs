/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_api::{app::{build_router, AppState}, config::Config};
/// use taskdesk_shared::clock::SystemClock;
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::repository::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::new(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), Arc::new(SystemClock), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::jwt_auth_layer, middleware::security::SecurityHeadersLayer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use taskdesk_shared::{
    clock::Clock,
    lifecycle::TaskLifecycle,
    notify::{NotificationDispatcher, NotificationHub},
    repository::{NotificationRepository, TaskRepository, UserRepository},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field
/// is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub users: Arc<dyn UserRepository>,

    /// All task mutations go through here
    pub lifecycle: Arc<TaskLifecycle>,

    /// Shared with the deadline sweep so both publish to the hub
    pub dispatcher: NotificationDispatcher,

    /// Live WebSocket rooms
    pub hub: Arc<NotificationHub>,

    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the lifecycle engine and notification hub over one store
    pub fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>, config: Config) -> Self
    where
        S: TaskRepository + NotificationRepository + UserRepository + 'static,
    {
        let hub = Arc::new(NotificationHub::default());
        let dispatcher = NotificationDispatcher::new(store.clone(), hub.clone(), clock.clone());
        let lifecycle = Arc::new(TaskLifecycle::new(
            store.clone(),
            store.clone(),
            dispatcher.clone(),
            clock.clone(),
        ));

        Self {
            tasks: store.clone(),
            notifications: store.clone(),
            users: store,
            lifecycle,
            dispatcher,
            hub,
            clock,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                         public
/// ├── GET /ws                             authenticates in-band
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /login                 public
///     │   ├── POST /refresh               public
///     │   ├── GET  /me
///     │   └── PUT  /password
///     ├── /tasks/
///     │   ├── POST, GET /
///     │   ├── GET, PUT, DELETE /:id
///     │   └── PATCH /:id/status | /:id/cancel | /:id/report | /:id/reassign
///     ├── /notifications/
///     │   ├── GET, DELETE /
///     │   ├── GET /unread-count
///     │   ├── PATCH /mark-all-read
///     │   ├── PATCH /:id/read
///     │   └── DELETE /:id
///     ├── /users/                         managers only
///     │   ├── POST, GET /
///     │   └── GET, PUT, DELETE /:id
///     └── GET /dashboard/stats
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_auth = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/status", patch(routes::tasks::update_status))
        .route("/:id/cancel", patch(routes::tasks::cancel_task))
        .route("/:id/report", patch(routes::tasks::attach_report))
        .route("/:id/reassign", patch(routes::tasks::reassign_task));

    let notification_routes = Router::new()
        .route(
            "/",
            get(routes::notifications::list_notifications)
                .delete(routes::notifications::delete_all_notifications),
        )
        .route("/unread-count", get(routes::notifications::unread_count))
        .route("/mark-all-read", patch(routes::notifications::mark_all_read))
        .route("/:id/read", patch(routes::notifications::mark_read))
        .route(
            "/:id",
            axum::routing::delete(routes::notifications::delete_notification),
        );

    let user_routes = Router::new()
        .route(
            "/",
            post(routes::users::create_user).get(routes::users::list_users),
        )
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        );

    let authenticated = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/password", put(routes::auth::change_password))
        .nest("/tasks", task_routes)
        .nest("/notifications", notification_routes)
        .nest("/users", user_routes)
        .route("/dashboard/stats", get(routes::dashboard::stats))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", public_auth)
        .merge(authenticated)
        .layer(CompressionLayer::new());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/ws", get(routes::ws::ws_handler))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
