use anyhow::{Context, Result, anyhow};
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use crate::config::DatabaseConfig;

pub type DbPool = Pool<AsyncPgConnection>;

pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    Pool::builder()
        .max_size(config.pool_max_size)
        .connection_timeout(config.transaction_timeout)
        .build(manager)
        .await
        .context("Failed to build the DB connection pool")
}

/// Runs pending migrations over a synchronous connection on the blocking pool.
/// Returns how many were applied.
pub async fn run_migrations_blocking(migrations: EmbeddedMigrations, url: &str) -> Result<usize> {
    let url = url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn =
            PgConnection::establish(&url).context("Failed to connect for migrations")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|e| anyhow!("Failed to run migrations: {e}"))?;
        Ok::<usize, anyhow::Error>(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
