use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionReview};

/// A question the user attempted and got wrong, retained for spaced review.
///
/// Two entries with identical question text are the same mistake for this
/// system's purposes, whatever their ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub question: Question,
    pub user_answer: usize,
}

impl Mistake {
    /// Extracts a mistake from a per-question review, if it was an
    /// attempted wrong answer.
    #[must_use]
    pub fn from_review(review: &QuestionReview) -> Option<Self> {
        if !review.attempted || review.is_correct {
            return None;
        }
        review.user_answer.map(|user_answer| Self {
            question: review.question.clone(),
            user_answer,
        })
    }

    /// Deduplication key for the mistake bank.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.question.text
    }
}
