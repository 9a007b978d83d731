use thiserror::Error;

use crate::model::{ParseModeError, ParsePaperError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Paper(#[from] ParsePaperError),
    #[error(transparent)]
    Mode(#[from] ParseModeError),
}
