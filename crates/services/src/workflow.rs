use std::sync::Arc;

use serde_json::Value;

use prelims_core::Clock;
use prelims_core::model::{Mistake, Question, QuizConfig, QuizResult};
use storage::QuizStore;

use crate::bank::BankSource;
use crate::catalog;
use crate::error::{LaunchError, SessionError};
use crate::normalizer::Normalizer;
use crate::sessions::{QuizSession, SessionSnapshot};
use crate::validator;

//
// ─── WORKFLOW ─────────────────────────────────────────────────────────────────
//

/// Key under which a suspended session lives in the store.
const SESSION_KEY: &str = "current_session";

/// Ties the pipeline together: bank source → normalizer → validator →
/// session, plus persistence of results, mistakes and suspended sessions.
pub struct QuizWorkflow {
    clock: Clock,
    store: QuizStore,
    source: Arc<dyn BankSource>,
    normalizer: Normalizer,
}

impl QuizWorkflow {
    #[must_use]
    pub fn new(store: QuizStore, source: Arc<dyn BankSource>, clock: Clock) -> Self {
        Self {
            clock,
            store,
            source,
            normalizer: Normalizer::new(clock),
        }
    }

    #[must_use]
    pub fn store(&self) -> &QuizStore {
        &self.store
    }

    /// Fetch the configured subject's bank and start a session from it.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` when the bank cannot be fetched, fails
    /// validation, or cannot seed a session.
    pub async fn launch(&self, config: QuizConfig) -> Result<QuizSession, LaunchError> {
        let file = catalog::file_name_for(&config.subject);
        let raw = self.source.fetch(file).await?;
        self.launch_from_raw(config, &raw)
    }

    /// Start a practice session over the stored mistake bank.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::Session` wrapping `EmptyBank` when no
    /// mistakes have been recorded yet.
    pub async fn launch_mistakes(&self, config: QuizConfig) -> Result<QuizSession, LaunchError> {
        let questions: Vec<Question> = self
            .store
            .mistakes()
            .await
            .into_iter()
            .map(|mistake| mistake.question)
            .collect();
        Ok(QuizSession::start(config, questions, self.clock.now())?)
    }

    fn launch_from_raw(&self, config: QuizConfig, raw: &Value) -> Result<QuizSession, LaunchError> {
        let bank = self.normalizer.normalize(raw);
        if bank.dropped > 0 {
            log::warn!(
                "{} record(s) in the {} bank were unusable and dropped",
                bank.dropped,
                config.subject
            );
        }
        validator::validate(&bank.questions)?;
        Ok(QuizSession::start(config, bank.questions, self.clock.now())?)
    }

    /// Score the session, persist the result and its mistakes, and drop
    /// any suspended snapshot.
    ///
    /// Persistence failures are logged, not propagated: the candidate
    /// still gets their scored result even when the store misbehaves.
    pub async fn finish(&self, session: QuizSession) -> QuizResult {
        let mut result = session.finish();

        let mistakes: Vec<Mistake> = result.detail.iter().filter_map(Mistake::from_review).collect();
        if let Err(err) = self.store.save_mistakes(mistakes).await {
            log::error!("could not update the mistake bank: {err}");
        }

        match self.store.save_result(result.clone()).await {
            Ok(id) => {
                result.id = Some(id);
                result.saved_at = Some(self.clock.now());
            }
            Err(err) => log::error!("could not save the result to history: {err}"),
        }

        if let Err(err) = self.store.remove(SESSION_KEY).await {
            log::error!("could not clear the suspended session: {err}");
        }

        result
    }

    /// Persist the session so it can be resumed later.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::Store` when the snapshot cannot be written.
    pub async fn suspend(&self, session: &QuizSession) -> Result<(), LaunchError> {
        let snapshot = session.snapshot(self.clock.now());
        self.store.set(SESSION_KEY, &snapshot).await?;
        Ok(())
    }

    /// Rebuild a suspended session, if one exists and is still coherent.
    /// A corrupt snapshot is discarded rather than resurrected.
    pub async fn try_resume(&self) -> Option<QuizSession> {
        let snapshot: Option<SessionSnapshot> = self.store.get(SESSION_KEY, None).await;
        let snapshot = snapshot?;
        match QuizSession::resume(snapshot, self.clock.now()) {
            Ok(session) => Some(session),
            Err(err) => {
                log::warn!("discarding unusable suspended session: {err}");
                self.abandon().await;
                None
            }
        }
    }

    /// Drop any suspended session without scoring it.
    pub async fn abandon(&self) {
        if let Err(err) = self.store.remove(SESSION_KEY).await {
            log::error!("could not remove the suspended session: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::StaticBankSource;
    use prelims_core::model::{Mode, Paper};
    use prelims_core::time::fixed_clock;
    use storage::InMemoryRepository;
    use serde_json::json;

    fn raw_bank(count: usize) -> Value {
        let questions: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "id": format!("q{i}"),
                    "text": format!("Question number {i}?"),
                    "options": ["Option A", "Option B", "Option C", "Option D"],
                    "correct": 1,
                    "explanation": "Because."
                })
            })
            .collect();
        json!(questions)
    }

    fn workflow_with(source: StaticBankSource) -> QuizWorkflow {
        let store = QuizStore::new(Arc::new(InMemoryRepository::new()), fixed_clock());
        QuizWorkflow::new(store, Arc::new(source), fixed_clock())
    }

    #[tokio::test]
    async fn launch_resolves_the_subject_to_its_bank_file() {
        let source = StaticBankSource::new().with_bank("polity.json", raw_bank(8));
        let workflow = workflow_with(source);

        let config = QuizConfig::new("Indian Polity", 5, Mode::Learning, Paper::Gs1);
        let session = workflow.launch(config).await.unwrap();
        assert_eq!(session.questions().len(), 5);
    }

    #[tokio::test]
    async fn launch_surfaces_validation_failures() {
        let source = StaticBankSource::new().with_bank(
            "polity.json",
            json!([{"id": "q0", "text": "Only one option?", "options": ["A"], "correct": 0}]),
        );
        let workflow = workflow_with(source);

        let config = QuizConfig::new("Indian Polity", 5, Mode::Learning, Paper::Gs1);
        let err = workflow.launch(config).await.unwrap_err();
        assert!(matches!(err, LaunchError::Validation(_)));
    }

    #[tokio::test]
    async fn mistake_practice_needs_a_nonempty_bank() {
        let workflow = workflow_with(StaticBankSource::new());
        let config = QuizConfig::new("Mistakes", 5, Mode::Learning, Paper::Gs1);
        let err = workflow.launch_mistakes(config).await.unwrap_err();
        assert!(matches!(err, LaunchError::Session(SessionError::EmptyBank)));
    }

    #[tokio::test]
    async fn suspend_then_resume_restores_the_session() {
        let source = StaticBankSource::new().with_bank("polity.json", raw_bank(6));
        let workflow = workflow_with(source);

        let config = QuizConfig::new("Indian Polity", 6, Mode::Test, Paper::Gs1);
        let mut session = workflow.launch(config).await.unwrap();
        session.save_answer(1).unwrap();
        session.move_to(2);
        workflow.suspend(&session).await.unwrap();

        let resumed = workflow.try_resume().await.unwrap();
        assert_eq!(resumed.current_idx(), 2);
        assert_eq!(resumed.answer_at(0), Some(1));
    }

    #[tokio::test]
    async fn finish_persists_result_and_mistakes_and_clears_the_snapshot() {
        let source = StaticBankSource::new().with_bank("polity.json", raw_bank(4));
        let workflow = workflow_with(source);

        let config = QuizConfig::new("Indian Polity", 4, Mode::Test, Paper::Gs1);
        let mut session = workflow.launch(config).await.unwrap();
        workflow.suspend(&session).await.unwrap();
        session.save_answer(1).unwrap(); // correct
        session.move_to(1);
        session.save_answer(0).unwrap(); // wrong

        let result = workflow.finish(session).await;
        assert!(result.id.is_some());
        assert_eq!(result.correct, 1);
        assert_eq!(result.wrong, 1);

        assert_eq!(workflow.store().history().await.len(), 1);
        assert_eq!(workflow.store().mistakes().await.len(), 1);
        assert!(workflow.try_resume().await.is_none());
    }
}
