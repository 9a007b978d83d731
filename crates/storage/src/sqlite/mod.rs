use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

mod kv_repo;
mod migrate;

/// SQLite-backed key-value repository.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    byte_budget: Option<usize>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL and create the schema.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established
    /// or the migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self {
            pool,
            byte_budget: None,
        })
    }

    /// Budget the total bytes of stored values, as the in-memory backend
    /// does. Mostly useful for exercising quota handling against a real
    /// database.
    #[must_use]
    pub fn with_byte_budget(mut self, budget: usize) -> Self {
        self.byte_budget = Some(budget);
        self
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
