use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by key-value storage backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The write would exceed the backend's byte budget.
    ///
    /// Backends enforce an optional byte budget; `QuizStore` reacts to
    /// this error by trimming history and retrying the write.
    #[error("storage quota exceeded: write of {attempted} bytes over budget of {budget}")]
    QuotaExceeded { attempted: usize, budget: usize },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Contract for a flat string-keyed JSON store.
///
/// Values are opaque serialized strings at this layer; namespacing,
/// parsing, and collection semantics (history, mistakes) belong to
/// `QuizStore` on top.
#[async_trait]
pub trait KeyValueRepository: Send + Sync {
    /// Fetch the raw value for a key, if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the raw value for a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::QuotaExceeded` if the write would exceed the
    /// backend's byte budget, or other storage errors.
    async fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// List all keys starting with the given prefix.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// In-memory backend for tests and prototyping, with an optional byte
/// budget over the sum of stored values.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
    byte_budget: Option<usize>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            byte_budget: None,
        }
    }

    /// Budget the total bytes of stored values; writes past it fail with
    /// `StorageError::QuotaExceeded`.
    #[must_use]
    pub fn with_byte_budget(mut self, budget: usize) -> Self {
        self.byte_budget = Some(budget);
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl KeyValueRepository for InMemoryRepository {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if let Some(budget) = self.byte_budget {
            let others: usize = guard
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let attempted = others + value.len();
            if attempted > budget {
                return Err(StorageError::QuotaExceeded { attempted, budget });
            }
        }
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let guard = self.lock()?;
        let mut keys: Vec<String> = guard
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_and_removes() {
        let repo = InMemoryRepository::new();
        repo.set_raw("a", "1").await.unwrap();
        assert_eq!(repo.get_raw("a").await.unwrap().as_deref(), Some("1"));

        repo.remove("a").await.unwrap();
        assert_eq!(repo.get_raw("a").await.unwrap(), None);
        // absent key is fine
        repo.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn budget_rejects_oversized_writes() {
        let repo = InMemoryRepository::new().with_byte_budget(10);
        repo.set_raw("a", "12345").await.unwrap();

        let err = repo.set_raw("b", "1234567").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        // replacing a key's own value does not double-count it
        repo.set_raw("a", "1234567890").await.unwrap();
    }

    #[tokio::test]
    async fn lists_keys_by_prefix() {
        let repo = InMemoryRepository::new();
        repo.set_raw("app_history", "[]").await.unwrap();
        repo.set_raw("app_mistakes", "[]").await.unwrap();
        repo.set_raw("other", "x").await.unwrap();

        let keys = repo.keys_with_prefix("app_").await.unwrap();
        assert_eq!(keys, vec!["app_history", "app_mistakes"]);
    }
}
