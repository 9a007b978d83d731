use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

use prelims_core::model::{Question, QuestionReview, QuizConfig, QuizResult};

use super::timer::{CountdownTimer, TimerTick};
use crate::error::SessionError;

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// One in-progress quiz attempt: the sampled questions, the sparse answer
/// map, the cursor, and (in test mode) the countdown.
///
/// A session is an owned value and `finish` consumes it, which is what
/// enforces the single-active-session rule: there is no global slot to
/// leak a stale timer or a half-finished attempt through.
#[derive(Debug)]
pub struct QuizSession {
    config: QuizConfig,
    questions: Vec<Question>,
    /// Position → selected option index. Absence means unattempted.
    answers: HashMap<usize, usize>,
    current_idx: usize,
    timer: Option<CountdownTimer>,
}

impl QuizSession {
    /// Start a session: sample `min(config.count, bank size)` questions
    /// with an unbiased shuffle, reset the answer map and cursor, and arm
    /// the countdown in test mode.
    ///
    /// The bank is expected to have passed validation already.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ZeroCount` or `SessionError::EmptyBank` on a
    /// config or bank that cannot produce a session.
    pub fn start(
        config: QuizConfig,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if config.count == 0 {
            return Err(SessionError::ZeroCount);
        }
        if questions.is_empty() {
            return Err(SessionError::EmptyBank);
        }

        // Fisher-Yates, then take the prefix. Uniform over permutations,
        // unlike sorting by a random comparator.
        let mut sampled = questions;
        sampled.shuffle(&mut rand::rng());
        sampled.truncate(config.count.min(sampled.len()));

        let timer = config.mode.is_timed().then(|| {
            let total = sampled.len() as u64 * config.paper.seconds_per_question();
            CountdownTimer::start(now, total)
        });

        Ok(Self {
            config,
            questions: sampled,
            answers: HashMap::new(),
            current_idx: 0,
            timer,
        })
    }

    pub(super) fn from_parts(
        config: QuizConfig,
        questions: Vec<Question>,
        answers: HashMap<usize, usize>,
        current_idx: usize,
        timer: Option<CountdownTimer>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        if current_idx >= questions.len() {
            return Err(SessionError::CursorOutOfRange {
                index: current_idx,
                total: questions.len(),
            });
        }
        Ok(Self {
            config,
            questions,
            answers,
            current_idx,
            timer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_idx(&self) -> usize {
        self.current_idx
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_idx]
    }

    /// The answer recorded at a position, if any.
    #[must_use]
    pub fn answer_at(&self, index: usize) -> Option<usize> {
        self.answers.get(&index).copied()
    }

    pub(super) fn answers(&self) -> &HashMap<usize, usize> {
        &self.answers
    }

    pub(super) fn timer(&self) -> Option<&CountdownTimer> {
        self.timer.as_ref()
    }

    /// Record an answer for the current question, overwriting any earlier
    /// choice. Changing one's mind is always allowed, including after
    /// feedback in learning mode.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OptionOutOfRange` rather than corrupting
    /// state when the index does not name an option.
    pub fn save_answer(&mut self, option: usize) -> Result<(), SessionError> {
        let available = self.current_question().options.len();
        if option >= available {
            return Err(SessionError::OptionOutOfRange { option, available });
        }
        self.answers.insert(self.current_idx, option);
        Ok(())
    }

    /// Move the cursor to an absolute position. Returns false (and leaves
    /// the cursor put) when the position is out of bounds.
    pub fn move_to(&mut self, index: usize) -> bool {
        if index >= self.questions.len() {
            return false;
        }
        self.current_idx = index;
        true
    }

    /// Seconds remaining at `now`; `None` for untimed sessions.
    #[must_use]
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<u64> {
        self.timer.as_ref().map(|timer| timer.time_left(now))
    }

    /// Total armed duration in seconds; `None` for untimed sessions.
    #[must_use]
    pub fn total_duration(&self) -> Option<u64> {
        self.timer.as_ref().map(CountdownTimer::total_seconds)
    }

    /// Observe the countdown. `None` for untimed sessions; otherwise the
    /// tick reports expiry exactly once, and finishing stays the caller's
    /// decision.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TimerTick> {
        self.timer.as_mut().map(|timer| timer.tick(now))
    }

    /// Score the session and consume it.
    ///
    /// Applies the paper's negative-marking weights over the
    /// attempted/correct classification, clamps the total at zero, and
    /// keeps the full per-question detail for mistake extraction and
    /// review.
    #[must_use]
    pub fn finish(self) -> QuizResult {
        let marking = self.config.paper.marking();

        let mut correct = 0_u32;
        let mut wrong = 0_u32;
        let detail: Vec<QuestionReview> = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(idx, question)| {
                let user_answer = self.answers.get(&idx).copied();
                let attempted = user_answer.is_some();
                let is_correct = user_answer == Some(question.correct);
                if attempted {
                    if is_correct {
                        correct += 1;
                    } else {
                        wrong += 1;
                    }
                }
                QuestionReview {
                    question,
                    user_answer,
                    is_correct,
                    attempted,
                }
            })
            .collect();

        let total = detail.len() as u32;
        let attempted = correct + wrong;
        let skipped = total - attempted;

        let raw = f64::from(correct) * marking.positive - f64::from(wrong) * marking.negative;
        let score = round2(raw.max(0.0));
        let accuracy = if attempted > 0 {
            (100.0 * f64::from(correct) / f64::from(attempted)).round() as u32
        } else {
            0
        };

        QuizResult {
            id: None,
            subject: self.config.subject,
            paper: self.config.paper,
            score,
            correct,
            wrong,
            skipped,
            attempted,
            accuracy,
            total,
            detail,
            saved_at: None,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
