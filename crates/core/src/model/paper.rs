use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown paper: {0:?} (expected \"gs1\" or \"csat\")")]
pub struct ParsePaperError(pub String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown mode: {0:?} (expected \"test\" or \"learning\")")]
pub struct ParseModeError(pub String);

//
// ─── PAPER ────────────────────────────────────────────────────────────────────
//

/// Per-correct and per-wrong marks for a paper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marking {
    pub positive: f64,
    pub negative: f64,
}

/// Scoring and timing regime of a UPSC prelims paper.
///
/// The weights and per-question allotments are fixed constants of the exam,
/// not configuration:
/// - GS Paper 1: 100 questions in 120 minutes, +2.0 / −0.666
/// - CSAT Paper 2: 80 questions in 120 minutes, +2.5 / −0.833
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paper {
    Gs1,
    Csat,
}

impl Paper {
    /// Seconds allotted per question in test mode.
    #[must_use]
    pub fn seconds_per_question(self) -> u64 {
        match self {
            Paper::Gs1 => 72,
            Paper::Csat => 90,
        }
    }

    /// Negative-marking weights for this paper.
    #[must_use]
    pub fn marking(self) -> Marking {
        match self {
            Paper::Gs1 => Marking {
                positive: 2.0,
                negative: 0.666,
            },
            Paper::Csat => Marking {
                positive: 2.5,
                negative: 0.833,
            },
        }
    }
}

impl fmt::Display for Paper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paper::Gs1 => write!(f, "gs1"),
            Paper::Csat => write!(f, "csat"),
        }
    }
}

impl FromStr for Paper {
    type Err = ParsePaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gs1" => Ok(Paper::Gs1),
            "csat" => Ok(Paper::Csat),
            other => Err(ParsePaperError(other.to_string())),
        }
    }
}

//
// ─── MODE ─────────────────────────────────────────────────────────────────────
//

/// How a session is administered.
///
/// `Test` arms the countdown timer. `Learning` is untimed and shows
/// immediate feedback; the feedback itself is a presentation concern, the
/// engine only cares that no timer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Test,
    Learning,
}

impl Mode {
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(self, Mode::Test)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Test => write!(f, "test"),
            Mode::Learning => write!(f, "learning"),
        }
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Mode::Test),
            "learning" => Ok(Mode::Learning),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
