mod service;
mod snapshot;
mod timer;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use service::QuizSession;
pub use snapshot::SessionSnapshot;
pub use timer::{CountdownTimer, TimerTick};
