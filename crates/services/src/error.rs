//! Shared error types for the services crate.

use thiserror::Error;

use storage::store::StoreError;

//
// ─── VALIDATION ───────────────────────────────────────────────────────────────
//

/// A question bank that cannot back a session.
///
/// Carries a bounded list of human-readable per-question problems; anything
/// past the cap is summarized as a remainder count. Fatal for session start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("question bank failed validation: {}", summarize(problems, *remaining))]
pub struct ValidationError {
    pub problems: Vec<String>,
    pub remaining: usize,
}

fn summarize(problems: &[String], remaining: usize) -> String {
    let joined = problems.join("; ");
    if remaining > 0 {
        format!("{joined} (and {remaining} more)")
    } else {
        joined
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// Errors emitted by the session engine.
///
/// There is no "no active session" variant: a `QuizSession` is an owned
/// value and finishing consumes it, so calls against a dead session do not
/// compile.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    EmptyBank,

    #[error("requested question count is zero")]
    ZeroCount,

    #[error("option {option} out of range for a question with {available} options")]
    OptionOutOfRange { option: usize, available: usize },

    #[error("saved session cursor {index} out of range for {total} questions")]
    CursorOutOfRange { index: usize, total: usize },
}

//
// ─── BANK LOADING ─────────────────────────────────────────────────────────────
//

/// Errors emitted while fetching a question-bank document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("no bank registered for file {file:?}")]
    NotFound { file: String },

    #[error("could not read bank file {path}: {reason}")]
    File { path: String, reason: String },

    #[error("bank fetch from {url} gave up after {attempts} attempts: {reason}")]
    Exhausted {
        url: String,
        attempts: u32,
        reason: String,
    },
}

//
// ─── WORKFLOW ─────────────────────────────────────────────────────────────────
//

/// Errors emitted while launching a session through `QuizWorkflow`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LaunchError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
