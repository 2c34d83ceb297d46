use std::time::Duration;

use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Pool for the relational application store. Connects eagerly, so an
/// unreachable database fails startup.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Could not connect to Postgres");
            e
        })?;
    tracing::info!("Connected to Postgres");
    Ok(pool)
}
