/// Schema migrations
///
/// The SQL files under `taskdesk-shared/migrations/` are compiled into the
/// binary with `sqlx::migrate!`. Both binaries run them on startup; sqlx
/// takes an advisory lock, so concurrent starts are safe.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{error, info};

/// Applied migration summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied_migrations: usize,
    pub latest_version: Option<i64>,
}

/// Applies pending migrations
///
/// # Errors
///
/// Fails when a migration errors or an applied one was edited afterwards
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .inspect_err(|e| error!(error = %e, "Migration failed"))?;

    info!("Database schema is up to date");
    Ok(())
}

/// Counts successful migrations recorded in `_sqlx_migrations`
///
/// Zero and `None` on a database that was never migrated.
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success",
    )
    .fetch_one(pool)
    .await
    .or_else(|e| {
        // 42P01: undefined_table
        let never_migrated = matches!(
            &e,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01")
        );
        if never_migrated {
            Ok((0, None))
        } else {
            Err(e)
        }
    })?;

    Ok(MigrationStatus {
        applied_migrations: usize::try_from(count).unwrap_or_default(),
        latest_version,
    })
}

/// Creates the database named in `database_url` when it is missing
///
/// Used by tests and local setup; production databases are provisioned
/// separately.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Creating missing database");
        Postgres::create_database(database_url).await?;
    }
    Ok(())
}
