use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Paper, Question};

//
// ─── PER-QUESTION DETAIL ──────────────────────────────────────────────────────
//

/// Outcome of a single question position within a finished session.
///
/// Retained in full on the result so mistake extraction and review screens
/// do not have to re-derive anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionReview {
    pub question: Question,
    /// Selected option index; `None` means the position was unattempted.
    pub user_answer: Option<usize>,
    pub is_correct: bool,
    pub attempted: bool,
}

//
// ─── RESULT ───────────────────────────────────────────────────────────────────
//

/// Aggregate outcome of a finished session.
///
/// `id` and `saved_at` are assigned by the store at save time; a result
/// that was never persisted carries neither. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(default)]
    pub id: Option<String>,
    pub subject: String,
    pub paper: Paper,
    /// Negative-marked total, clamped at zero and rounded to two decimals.
    pub score: f64,
    pub correct: u32,
    pub wrong: u32,
    pub skipped: u32,
    pub attempted: u32,
    /// `round(100 × correct / attempted)`, or 0 when nothing was attempted.
    pub accuracy: u32,
    pub total: u32,
    pub detail: Vec<QuestionReview>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}
