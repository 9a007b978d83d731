use std::sync::Arc;

use log::{error, warn};
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use prelims_core::Clock;
use prelims_core::model::{Mistake, QuizResult};

use crate::repository::{KeyValueRepository, StorageError};

//
// ─── CONSTANTS ────────────────────────────────────────────────────────────────
//

/// Prefix for every key this application writes. `clear_all` removes
/// exactly the keys under it and nothing else sharing the backend.
pub const NAMESPACE: &str = "upsc_";

/// Most results retained in history; oldest beyond this are evicted.
pub const HISTORY_CAP: usize = 50;

/// Most entries retained in the mistake bank.
pub const MISTAKE_CAP: usize = 100;

/// How many history entries survive a quota-triggered trim.
const QUOTA_TRIM_KEEP: usize = 10;

const HISTORY_KEY: &str = "history";
const MISTAKES_KEY: &str = "mistakes";

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── STORE ────────────────────────────────────────────────────────────────────
//

/// Namespaced JSON persistence with quota resilience and the two capped
/// collections (result history, mistake bank).
///
/// Reads never fail outward: absence, backend trouble, and parse failures
/// all collapse to the caller's fallback. Writes report failure only after
/// the quota remediation path has been exhausted.
#[derive(Clone)]
pub struct QuizStore {
    repo: Arc<dyn KeyValueRepository>,
    clock: Clock,
}

impl QuizStore {
    #[must_use]
    pub fn new(repo: Arc<dyn KeyValueRepository>, clock: Clock) -> Self {
        Self { repo, clock }
    }

    fn namespaced(key: &str) -> String {
        format!("{NAMESPACE}{key}")
    }

    /// Fetch and parse the value for a key, or the fallback on absence,
    /// read failure, or parse failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let raw = match self.repo.get_raw(&Self::namespaced(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return fallback,
            Err(err) => {
                error!("storage read failed for {key:?}: {err}");
                return fallback;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                error!("stored value for {key:?} is not parseable: {err}");
                fallback
            }
        }
    }

    /// Serialize and write a value.
    ///
    /// On a quota failure the history collection is trimmed to its most
    /// recent entries and the write retried once.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if serialization fails or the retried write
    /// still does not fit.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let full_key = Self::namespaced(key);

        match self.repo.set_raw(&full_key, &raw).await {
            Ok(()) => Ok(()),
            Err(StorageError::QuotaExceeded { attempted, budget }) => {
                warn!(
                    "storage quota hit writing {key:?} ({attempted} > {budget} bytes), \
                     trimming history and retrying"
                );
                self.trim_history_for_quota().await;
                self.repo.set_raw(&full_key, &raw).await.map_err(Into::into)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a key. Absent keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.repo
            .remove(&Self::namespaced(key))
            .await
            .map_err(Into::into)
    }

    async fn trim_history_for_quota(&self) {
        let mut history: Vec<QuizResult> = self.get(HISTORY_KEY, Vec::new()).await;
        if history.len() <= QUOTA_TRIM_KEEP {
            return;
        }
        history.truncate(QUOTA_TRIM_KEEP);
        let raw = match serde_json::to_string(&history) {
            Ok(raw) => raw,
            Err(err) => {
                error!("could not re-serialize trimmed history: {err}");
                return;
            }
        };
        if let Err(err) = self.repo.set_raw(&Self::namespaced(HISTORY_KEY), &raw).await {
            error!("could not write trimmed history: {err}");
        }
    }

    //
    // ─── HISTORY ──────────────────────────────────────────────────────────
    //

    /// Assign an id and timestamp, prepend to history, cap, write.
    ///
    /// Returns the assigned result id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails past quota remediation.
    pub async fn save_result(&self, mut result: QuizResult) -> Result<String, StoreError> {
        let id = format!(
            "result_{}_{}",
            self.clock.now().timestamp_millis(),
            random_suffix()
        );
        result.id = Some(id.clone());
        result.saved_at = Some(self.clock.now());

        let mut history: Vec<QuizResult> = self.get(HISTORY_KEY, Vec::new()).await;
        history.insert(0, result);
        history.truncate(HISTORY_CAP);
        self.set(HISTORY_KEY, &history).await?;
        Ok(id)
    }

    /// Most-recent-first result history.
    pub async fn history(&self) -> Vec<QuizResult> {
        self.get(HISTORY_KEY, Vec::new()).await
    }

    //
    // ─── MISTAKES ─────────────────────────────────────────────────────────
    //

    /// Merge new mistakes into the bank, newest first, deduplicated by
    /// question text, capped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails past quota remediation.
    pub async fn save_mistakes(&self, new_mistakes: Vec<Mistake>) -> Result<(), StoreError> {
        if new_mistakes.is_empty() {
            return Ok(());
        }
        let current: Vec<Mistake> = self.get(MISTAKES_KEY, Vec::new()).await;

        let mut seen = std::collections::HashSet::new();
        let mut merged = Vec::with_capacity(current.len() + new_mistakes.len());
        for mistake in new_mistakes.into_iter().chain(current) {
            if seen.insert(mistake.text().to_string()) {
                merged.push(mistake);
            }
        }
        merged.truncate(MISTAKE_CAP);
        self.set(MISTAKES_KEY, &merged).await
    }

    /// The deduplicated mistake bank, most recent misses first.
    pub async fn mistakes(&self) -> Vec<Mistake> {
        self.get(MISTAKES_KEY, Vec::new()).await
    }

    //
    // ─── MAINTENANCE ──────────────────────────────────────────────────────
    //

    /// Remove every key under this application's namespace.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read or written.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let keys = self.repo.keys_with_prefix(NAMESPACE).await?;
        for key in keys {
            self.repo.remove(&key).await?;
        }
        Ok(())
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use prelims_core::model::{Paper, Question, QuestionMetadata};
    use prelims_core::time::fixed_clock;

    fn store() -> (QuizStore, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let store = QuizStore::new(Arc::new(repo.clone()), fixed_clock());
        (store, repo)
    }

    fn result(subject: &str) -> QuizResult {
        QuizResult {
            id: None,
            subject: subject.into(),
            paper: Paper::Gs1,
            score: 10.0,
            correct: 5,
            wrong: 0,
            skipped: 5,
            attempted: 5,
            accuracy: 100,
            total: 10,
            detail: Vec::new(),
            saved_at: None,
        }
    }

    fn mistake(id: &str, text: &str) -> Mistake {
        Mistake {
            question: Question {
                id: id.into(),
                text: text.into(),
                options: vec!["a".into(), "b".into()],
                correct: 0,
                explanation: String::new(),
                metadata: QuestionMetadata::default(),
            },
            user_answer: 1,
        }
    }

    #[tokio::test]
    async fn get_falls_back_on_absence_and_garbage() {
        let (store, repo) = store();
        assert_eq!(store.get("missing", 7_u32).await, 7);

        repo.set_raw("upsc_broken", "{not json").await.unwrap();
        assert_eq!(store.get("broken", 7_u32).await, 7);
    }

    #[tokio::test]
    async fn save_result_assigns_id_and_prepends() {
        let (store, _) = store();
        let first = store.save_result(result("polity")).await.unwrap();
        let second = store.save_result(result("economy")).await.unwrap();
        assert_ne!(first, second);
        assert!(second.starts_with("result_"));

        let history = store.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].subject, "economy");
        assert_eq!(history[0].id.as_deref(), Some(second.as_str()));
        assert!(history[0].saved_at.is_some());
    }

    #[tokio::test]
    async fn history_caps_at_fifty_most_recent() {
        let (store, _) = store();
        for i in 0..51 {
            store.save_result(result(&format!("s{i}"))).await.unwrap();
        }
        let history = store.history().await;
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0].subject, "s50");
        // the very first save is the one evicted
        assert!(history.iter().all(|r| r.subject != "s0"));
    }

    #[tokio::test]
    async fn mistakes_dedup_by_text_not_id() {
        let (store, _) = store();
        store
            .save_mistakes(vec![mistake("a", "Which article?")])
            .await
            .unwrap();
        store
            .save_mistakes(vec![
                mistake("b", "Which article?"),
                mistake("c", "Which river?"),
            ])
            .await
            .unwrap();

        let bank = store.mistakes().await;
        assert_eq!(bank.len(), 2);
        // the fresh save wins the dedup and sits in front
        assert_eq!(bank[0].question.id, "b");
        assert_eq!(bank[1].question.id, "c");
    }

    #[tokio::test]
    async fn mistakes_cap_at_one_hundred() {
        let (store, _) = store();
        let batch: Vec<Mistake> = (0..110)
            .map(|i| mistake(&format!("id{i}"), &format!("Q{i}")))
            .collect();
        store.save_mistakes(batch).await.unwrap();
        assert_eq!(store.mistakes().await.len(), MISTAKE_CAP);
    }

    #[tokio::test]
    async fn quota_failure_trims_history_and_retries() {
        let repo = InMemoryRepository::new().with_byte_budget(16 * 1024);
        let store = QuizStore::new(Arc::new(repo), fixed_clock());

        // fill history until the budget is nearly consumed
        for i in 0..40 {
            let mut r = result(&format!("s{i}"));
            r.detail = Vec::new();
            if store.save_result(r).await.is_err() {
                break;
            }
        }
        let before = store.history().await.len();
        assert!(before > QUOTA_TRIM_KEEP);

        // a large unrelated write overflows, triggering the trim-and-retry
        let big = "x".repeat(12 * 1024);
        store.set("settings", &big).await.unwrap();

        let after = store.history().await.len();
        assert!(after <= QUOTA_TRIM_KEEP);
        assert_eq!(store.get("settings", String::new()).await, big);
    }

    #[tokio::test]
    async fn clear_all_spares_foreign_keys() {
        let (store, repo) = store();
        store.save_result(result("polity")).await.unwrap();
        store.set("visited", &true).await.unwrap();
        repo.set_raw("someone_elses_key", "untouched").await.unwrap();

        store.clear_all().await.unwrap();

        assert!(store.history().await.is_empty());
        assert!(!store.get("visited", false).await);
        assert_eq!(
            repo.get_raw("someone_elses_key").await.unwrap().as_deref(),
            Some("untouched")
        );
    }
}
