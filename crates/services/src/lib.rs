#![forbid(unsafe_code)]

pub mod bank;
pub mod catalog;
pub mod error;
pub mod normalizer;
pub mod sessions;
pub mod validator;
pub mod workflow;

pub use prelims_core::Clock;

pub use bank::{BankSource, DirBankSource, HttpBankSource, StaticBankSource};
pub use error::{BankError, LaunchError, SessionError, ValidationError};
pub use normalizer::{NormalizedBank, Normalizer};
pub use sessions::{CountdownTimer, QuizSession, SessionSnapshot, TimerTick};
pub use validator::validate;
pub use workflow::QuizWorkflow;
