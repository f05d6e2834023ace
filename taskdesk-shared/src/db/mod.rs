/// PostgreSQL plumbing
///
/// - `pool`: connection pool setup and liveness check
/// - `migrations`: embedded schema migrations
///
/// Queries themselves live next to the models in [`crate::models`] and are
/// reached through [`crate::repository::PgStore`].

pub mod migrations;
pub mod pool;
