use serde::{Deserialize, Serialize};

use crate::model::{Mode, Paper};

/// Parameters of one quiz attempt, fixed for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    pub subject: String,
    /// Requested question count; the session takes
    /// `min(count, bank size)`.
    pub count: usize,
    pub mode: Mode,
    pub paper: Paper,
}

impl QuizConfig {
    #[must_use]
    pub fn new(subject: impl Into<String>, count: usize, mode: Mode, paper: Paper) -> Self {
        Self {
            subject: subject.into(),
            count,
            mode,
            paper,
        }
    }
}
