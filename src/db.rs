//! Database connection pool management

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Settings;

/// Create the SQLite pool described by the settings and bring its schema up to date
pub async fn create_pool(settings: &Settings) -> Result<SqlitePool> {
    connect(&settings.database_url, settings.database_max_connections).await
}

/// Open `database_url`, creating the file if needed, and run pending migrations.
///
/// In-memory databases exist per connection, so they must be opened with a
/// single connection that is never recycled.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let in_memory = is_in_memory(database_url);

    let mut connect_options = SqliteConnectOptions::from_str(database_url)
        .context("Invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    if !in_memory {
        connect_options = connect_options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let mut pool_options = SqlitePoolOptions::new()
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5));

    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options
            .max_connections(max_connections.max(1))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
    };

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .context("Failed to open SQLite database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!(
        max_connections = if in_memory { 1 } else { max_connections.max(1) },
        in_memory,
        "Database connection pool established"
    );

    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Lightweight health check for database connectivity
pub async fn health_check(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://caregivers?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://caregivers.db"));
    }

    #[tokio::test]
    async fn in_memory_pool_is_migrated_and_healthy() {
        let pool = connect("sqlite::memory:", 8).await.expect("open database");
        assert!(health_check(&pool).await);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM caregivers")
            .fetch_one(&pool)
            .await
            .expect("caregivers table exists");
        assert_eq!(count, 0);

        pool.close().await;
        assert!(!health_check(&pool).await);
    }

    #[tokio::test]
    async fn unreachable_file_is_rejected() {
        let temp = tempfile::tempdir().expect("create tempdir");
        let url = format!(
            "sqlite://{}",
            temp.path().join("missing").join("caregivers.db").display()
        );
        assert!(connect(&url, 1).await.is_err());
    }
}
