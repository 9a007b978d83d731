use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{KeyValueRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl KeyValueRepository for SqliteRepository {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(value))
    }

    async fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(budget) = self.byte_budget {
            let row = sqlx::query(
                "SELECT COALESCE(SUM(LENGTH(value)), 0) AS total FROM kv WHERE key != ?1",
            )
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
            let others: i64 = row
                .try_get("total")
                .map_err(|err| StorageError::Serialization(err.to_string()))?;
            let attempted = usize::try_from(others).unwrap_or(usize::MAX) + value.len();
            if attempted > budget {
                return Err(StorageError::QuotaExceeded { attempted, budget });
            }
        }

        sqlx::query(
            r"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        // escape LIKE wildcards so a literal prefix match is guaranteed
        let escaped = prefix.replace('\\', r"\\").replace('%', r"\%").replace('_', r"\_");
        let rows = sqlx::query(r"SELECT key FROM kv WHERE key LIKE ?1 ESCAPE '\' ORDER BY key")
            .bind(format!("{escaped}%"))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            keys.push(
                row.try_get("key")
                    .map_err(|err| StorageError::Serialization(err.to_string()))?,
            );
        }
        Ok(keys)
    }
}
