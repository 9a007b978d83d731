use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prelims_core::model::{Question, QuizConfig};

use super::service::QuizSession;
use super::timer::CountdownTimer;
use crate::error::SessionError;

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// Serializable image of a session, taken so an interrupted attempt can be
/// resumed later. Timer state is stored as durations, not wall-clock
/// anchors: resuming re-anchors against the resume instant, so time spent
/// away does not count against the candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub config: QuizConfig,
    pub questions: Vec<Question>,
    pub answers: HashMap<usize, usize>,
    pub current_idx: usize,
    pub total_duration: Option<u64>,
    pub time_left: Option<u64>,
}

impl QuizSession {
    /// Capture the session for persistence. The question order is kept as
    /// shuffled so a resumed attempt looks identical to the suspended one.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            config: self.config().clone(),
            questions: self.questions().to_vec(),
            answers: self.answers().clone(),
            current_idx: self.current_idx(),
            total_duration: self.timer().map(CountdownTimer::total_seconds),
            time_left: self.timer().map(|timer| timer.time_left(now)),
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` or `SessionError::CursorOutOfRange`
    /// when the snapshot is internally inconsistent, e.g. hand-edited or
    /// written by a different version.
    pub fn resume(snapshot: SessionSnapshot, now: DateTime<Utc>) -> Result<Self, SessionError> {
        let timer = match (snapshot.total_duration, snapshot.time_left) {
            (Some(total), Some(left)) => Some(CountdownTimer::resume(now, total, left)),
            _ => None,
        };
        Self::from_parts(
            snapshot.config,
            snapshot.questions,
            snapshot.answers,
            snapshot.current_idx,
            timer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prelims_core::model::{Mode, Paper, QuestionMetadata};
    use prelims_core::time::fixed_now;

    fn bank(size: usize) -> Vec<Question> {
        (0..size)
            .map(|i| Question {
                id: format!("q{i}"),
                text: format!("Question {i}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: 0,
                explanation: String::new(),
                metadata: QuestionMetadata::default(),
            })
            .collect()
    }

    fn timed_config() -> QuizConfig {
        QuizConfig::new("Modern History", 5, Mode::Test, Paper::Gs1)
    }

    #[test]
    fn snapshot_round_trip_preserves_progress_and_order() {
        let start = fixed_now();
        let mut session = QuizSession::start(timed_config(), bank(5), start).unwrap();
        session.save_answer(2).unwrap();
        session.move_to(3);
        session.save_answer(1).unwrap();
        let order: Vec<String> = session.questions().iter().map(|q| q.id.clone()).collect();

        // 40 seconds in, suspend; come back two hours later
        let suspend_at = start + Duration::seconds(40);
        let snapshot = session.snapshot(suspend_at);
        assert_eq!(snapshot.time_left, Some(5 * 72 - 40));

        let resume_at = suspend_at + Duration::hours(2);
        let resumed = QuizSession::resume(snapshot, resume_at).unwrap();

        let resumed_order: Vec<String> =
            resumed.questions().iter().map(|q| q.id.clone()).collect();
        assert_eq!(resumed_order, order);
        assert_eq!(resumed.current_idx(), 3);
        assert_eq!(resumed.answer_at(0), Some(2));
        assert_eq!(resumed.answer_at(3), Some(1));
        // the two hours away cost nothing
        assert_eq!(resumed.time_left(resume_at), Some(5 * 72 - 40));
        assert_eq!(
            resumed.time_left(resume_at + Duration::seconds(10)),
            Some(5 * 72 - 50)
        );
    }

    #[test]
    fn untimed_snapshot_resumes_without_a_timer() {
        let config = QuizConfig::new("CSAT Quant", 3, Mode::Learning, Paper::Csat);
        let session = QuizSession::start(config, bank(3), fixed_now()).unwrap();
        let snapshot = session.snapshot(fixed_now());
        assert_eq!(snapshot.total_duration, None);

        let resumed = QuizSession::resume(snapshot, fixed_now()).unwrap();
        assert!(resumed.time_left(fixed_now()).is_none());
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let session = QuizSession::start(timed_config(), bank(5), fixed_now()).unwrap();
        let mut snapshot = session.snapshot(fixed_now());
        snapshot.current_idx = 9;

        let err = QuizSession::resume(snapshot, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::CursorOutOfRange { index: 9, total: 5 });

        let session = QuizSession::start(timed_config(), bank(5), fixed_now()).unwrap();
        let mut snapshot = session.snapshot(fixed_now());
        snapshot.questions.clear();
        snapshot.current_idx = 0;
        let err = QuizSession::resume(snapshot, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::EmptyBank);
    }
}
