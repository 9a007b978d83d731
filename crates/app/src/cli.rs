use std::path::PathBuf;

use clap::{Parser, Subcommand};

use prelims_core::model::{Mode, Paper};

/// UPSC prelims practice from the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "prelims")]
#[command(about = "Practice UPSC prelims questions with exam-style scoring", long_about = None)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// SQLite database path or URL (defaults to prelims.sqlite3)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<String>,

    /// Keep all progress in memory, nothing written to disk
    #[arg(long, global = true)]
    pub memory: bool,

    /// Directory holding the question bank JSON files
    #[arg(long, value_name = "DIR", default_value = "banks", global = true)]
    pub banks: PathBuf,

    /// Fetch question banks from this base URL instead of a directory
    #[arg(long, value_name = "URL", global = true)]
    pub bank_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a quiz (the default)
    Quiz {
        /// Subject id or display name, see `subjects`
        #[arg(long, default_value = "polity")]
        subject: String,

        /// Number of questions to draw
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Which paper's timing and marking scheme to apply
        #[arg(long, value_enum, default_value_t = PaperArg::Gs1)]
        paper: PaperArg,

        /// Untimed practice with instant feedback instead of a timed test
        #[arg(long)]
        learning: bool,
    },

    /// Re-practice questions you previously got wrong
    Mistakes {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },

    /// List the available subjects per paper
    Subjects,

    /// Show past results, most recent first
    History,

    /// Erase all saved progress
    Clear,
}

impl Command {
    #[must_use]
    pub fn quiz_defaults() -> Self {
        Self::Quiz {
            subject: "polity".into(),
            count: 10,
            paper: PaperArg::Gs1,
            learning: false,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperArg {
    Gs1,
    Csat,
}

impl From<PaperArg> for Paper {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::Gs1 => Paper::Gs1,
            PaperArg::Csat => Paper::Csat,
        }
    }
}

#[must_use]
pub fn mode_for(learning: bool) -> Mode {
    if learning { Mode::Learning } else { Mode::Test }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_ten_question_gs_test() {
        let args = Args::parse_from(["prelims", "quiz"]);
        match args.command {
            Some(Command::Quiz {
                subject,
                count,
                paper,
                learning,
            }) => {
                assert_eq!(subject, "polity");
                assert_eq!(count, 10);
                assert_eq!(paper, PaperArg::Gs1);
                assert!(!learning);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn paper_and_mode_flags_parse() {
        let args = Args::parse_from([
            "prelims", "quiz", "--subject", "quant", "--paper", "csat", "--learning",
        ]);
        match args.command {
            Some(Command::Quiz {
                paper, learning, ..
            }) => {
                assert_eq!(Paper::from(paper), Paper::Csat);
                assert_eq!(mode_for(learning), Mode::Learning);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_storage_flags_apply_to_subcommands() {
        let args = Args::parse_from(["prelims", "history", "--memory", "--banks", "data"]);
        assert!(args.memory);
        assert_eq!(args.banks, PathBuf::from("data"));
        assert!(matches!(args.command, Some(Command::History)));
    }
}
