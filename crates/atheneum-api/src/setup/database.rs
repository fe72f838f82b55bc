//! Content-store selection and database setup.

use anyhow::{Context, Result};
use atheneum_core::Config;
use atheneum_db::{ContentStore, MemoryStore, PgStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Build the content store the configuration asks for.
///
/// `DATABASE_URL` present: connect, run migrations, return the relational
/// store. Absent: the in-memory store (single-process development).
pub async fn setup_content_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    match config.database_url {
        Some(ref url) => {
            let pool = PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
                .connect(url)
                .await
                .context("Failed to connect to database")?;

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Using relational content store");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory content store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
