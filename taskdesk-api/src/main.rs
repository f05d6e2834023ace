//! # TaskDesk API Server
//!
//! Task assignment backend: managers create and assign service tasks,
//! employees work them, and both sides are notified of changes through a
//! persistent inbox and a live WebSocket.
//!
//! The deadline sweep runs inside this process unless `SWEEP_ENABLED=false`,
//! in which case run the `taskdesk-worker` binary instead.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskdesk-api
//! ```

use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdesk_api::{
    app::{build_router, AppState},
    bootstrap,
    config::Config,
};
use taskdesk_shared::{
    clock::SystemClock,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    repository::PgStore,
};
use taskdesk_worker::{config::SweepConfig, sweep::DeadlineSweep};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskdesk_api=debug,taskdesk_shared=info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is loaded before tracing so RUST_LOG and LOG_FORMAT apply
    dotenvy::dotenv().ok();
    init_tracing();

    info!("TaskDesk API Server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::new(config.database.url.clone())
    })
    .await?;
    run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let clock = Arc::new(SystemClock);

    if let Some(manager) = &config.bootstrap {
        bootstrap::ensure_manager(store.as_ref(), clock.as_ref(), manager).await?;
    }

    let bind_address = config.bind_address();
    let sweep_enabled = config.sweep_enabled;
    let state = AppState::new(store.clone(), clock.clone(), config);

    let shutdown = CancellationToken::new();

    let sweep_handle = if sweep_enabled {
        let sweep = DeadlineSweep::new(
            store.clone(),
            store.clone(),
            state.dispatcher.clone(),
            clock.clone(),
            SweepConfig::from_env()?,
        );
        let token = shutdown.clone();
        Some(tokio::spawn(async move { sweep.run(token).await }))
    } else {
        info!("Deadline sweep disabled in this process");
        None
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on http://{}", bind_address);

    let signal_token = shutdown.clone();
    tokio::spawn(shutdown_signal(signal_token));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled_owned().await })
        .await?;

    if let Some(handle) = sweep_handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Deadline sweep task panicked");
        }
    }

    close_pool(pool).await;
    info!("Server stopped");
    Ok(())
}
