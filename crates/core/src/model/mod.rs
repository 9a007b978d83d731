mod config;
mod mistake;
mod paper;
mod question;
mod result;

pub use config::QuizConfig;
pub use mistake::Mistake;
pub use paper::{Marking, Mode, Paper, ParseModeError, ParsePaperError};
pub use question::{Question, QuestionMetadata};
pub use result::{QuestionReview, QuizResult};
