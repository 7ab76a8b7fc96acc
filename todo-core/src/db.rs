use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::TodoResult;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Build the process-wide pool. Called once at startup; the pool is then
/// cloned into whatever needs it.
pub async fn create_pool(config: &DatabaseConfig) -> TodoResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect(&config.url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> TodoResult<()> {
    sqlx::migrate!("../migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> TodoResult<String> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}
