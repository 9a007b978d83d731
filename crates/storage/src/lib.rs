#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;
pub mod store;

pub use repository::{InMemoryRepository, KeyValueRepository, StorageError};
pub use sqlite::{SqliteInitError, SqliteRepository};
pub use store::{QuizStore, StoreError, HISTORY_CAP, MISTAKE_CAP};
