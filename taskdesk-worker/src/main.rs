//! # TaskDesk Worker
//!
//! Runs the deadline sweep as a standalone process, for deployments where
//! the API server has `SWEEP_ENABLED=false`. Notifications are persisted
//! only; clients pick them up from their inbox.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskdesk cargo run -p taskdesk-worker
//! ```

use std::sync::Arc;
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdesk_shared::clock::SystemClock;
use taskdesk_shared::db::migrations::run_migrations;
use taskdesk_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use taskdesk_shared::notify::{NoopPublisher, NotificationDispatcher};
use taskdesk_shared::repository::PgStore;
use taskdesk_worker::config::SweepConfig;
use taskdesk_worker::sweep::DeadlineSweep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskdesk_worker=info,taskdesk_shared=info".into());
    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("TaskDesk Worker v{} starting", env!("CARGO_PKG_VERSION"));

    let sweep_config = SweepConfig::from_env().context("Invalid SWEEP_* configuration")?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = create_pool(DatabaseConfig::new(database_url)).await?;
    run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let clock = Arc::new(SystemClock);
    let dispatcher =
        NotificationDispatcher::new(store.clone(), Arc::new(NoopPublisher), clock.clone());
    let sweep = DeadlineSweep::new(store.clone(), store, dispatcher, clock, sweep_config);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        signal.cancel();
    });

    sweep.run(shutdown).await;

    close_pool(pool).await;
    tracing::info!("Worker stopped");
    Ok(())
}
