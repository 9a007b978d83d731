mod cli;

use std::io::{BufRead, Write as _};
use std::sync::Arc;

use clap::Parser;

use prelims_core::Clock;
use prelims_core::model::{Mode, Paper, QuizConfig, QuizResult};
use services::catalog;
use services::{
    BankSource, DirBankSource, HttpBankSource, LaunchError, QuizSession, QuizWorkflow,
    SessionError,
};
use storage::{InMemoryRepository, KeyValueRepository, QuizStore, SqliteRepository};

use cli::{Args, Command};

const OPTION_LABELS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

fn option_label(idx: usize) -> char {
    OPTION_LABELS.get(idx).copied().unwrap_or('?')
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let command = args.command.clone().unwrap_or_else(Command::quiz_defaults);

    let clock = Clock::default_clock();
    let repo = build_repository(&args).await?;
    let store = QuizStore::new(repo, clock);
    let source = build_source(&args);
    let workflow = QuizWorkflow::new(store, source, clock);

    match command {
        Command::Quiz {
            subject,
            count,
            paper,
            learning,
        } => {
            if let Some(resumed) = offer_resume(&workflow).await {
                return run_quiz(&workflow, resumed, clock).await;
            }
            let config = QuizConfig::new(subject, count, cli::mode_for(learning), paper.into());
            let session = workflow.launch(config).await?;
            run_quiz(&workflow, session, clock).await
        }
        Command::Mistakes { count } => {
            let config = QuizConfig::new("Mistake Practice", count, Mode::Learning, Paper::Gs1);
            match workflow.launch_mistakes(config).await {
                Ok(session) => run_quiz(&workflow, session, clock).await,
                Err(LaunchError::Session(SessionError::EmptyBank)) => {
                    println!("No mistakes recorded yet. Finish a quiz first.");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
        Command::Subjects => {
            print_subjects();
            Ok(())
        }
        Command::History => {
            print_history(&workflow.store().history().await);
            Ok(())
        }
        Command::Clear => {
            workflow.store().clear_all().await?;
            println!("All saved progress removed.");
            Ok(())
        }
    }
}

async fn build_repository(
    args: &Args,
) -> Result<Arc<dyn KeyValueRepository>, Box<dyn std::error::Error>> {
    if args.memory {
        return Ok(Arc::new(InMemoryRepository::new()));
    }
    let db_url = normalize_sqlite_url(args.db.clone().unwrap_or_else(|| "prelims.sqlite3".into()));
    prepare_sqlite_file(&db_url)?;
    let repo = SqliteRepository::connect(&db_url).await?;
    Ok(Arc::new(repo))
}

fn build_source(args: &Args) -> Arc<dyn BankSource> {
    match &args.bank_url {
        Some(url) => Arc::new(HttpBankSource::new(url.clone())),
        None => Arc::new(DirBankSource::new(args.banks.clone())),
    }
}

async fn offer_resume(workflow: &QuizWorkflow) -> Option<QuizSession> {
    let session = workflow.try_resume().await?;
    println!(
        "A suspended {} session with {} question(s) was found.",
        session.config().subject,
        session.questions().len()
    );
    if prompt("Resume it? [y/N] ").eq_ignore_ascii_case("y") {
        Some(session)
    } else {
        workflow.abandon().await;
        None
    }
}

async fn run_quiz(
    workflow: &QuizWorkflow,
    mut session: QuizSession,
    clock: Clock,
) -> Result<(), Box<dyn std::error::Error>> {
    let learning = session.config().mode == Mode::Learning;
    println!(
        "\n{}: {} question(s), {}.\n",
        session.config().subject,
        session.questions().len(),
        if learning {
            "untimed learning mode".to_string()
        } else {
            format!(
                "{} on the clock",
                format_clock(session.total_duration().unwrap_or(0))
            )
        }
    );
    println!("Answer with a letter. n/p to move, g <n> to jump, f to finish, s to suspend, q to quit.\n");

    loop {
        if let Some(tick) = session.tick(clock.now()) {
            if tick.expired {
                println!("\nTime is up.");
                break;
            }
            println!("  [{} left]", format_clock(tick.time_left));
        }

        print_question(&session);

        let input = prompt("> ");
        let input = input.trim();
        match input {
            "" => {}
            "f" => break,
            "s" => {
                workflow.suspend(&session).await?;
                println!("Session suspended. Run the same command again to resume.");
                return Ok(());
            }
            "q" => {
                workflow.abandon().await;
                println!("Session discarded.");
                return Ok(());
            }
            "n" => {
                let next = session.current_idx() + 1;
                if !session.move_to(next) {
                    println!("Already at the last question.");
                }
            }
            "p" => {
                let idx = session.current_idx();
                if idx == 0 || !session.move_to(idx - 1) {
                    println!("Already at the first question.");
                }
            }
            other if other.starts_with('g') => {
                let target = other[1..].trim().parse::<usize>().ok();
                match target {
                    Some(n) if n >= 1 && session.move_to(n - 1) => {}
                    _ => println!(
                        "Pick a question between 1 and {}.",
                        session.questions().len()
                    ),
                }
            }
            other => match parse_option(other, session.current_question().options.len()) {
                Some(option) => {
                    // range already checked against the current question
                    session.save_answer(option)?;
                    if learning {
                        print_feedback(&session);
                    }
                    let next = session.current_idx() + 1;
                    session.move_to(next);
                }
                None => println!("Unrecognized input: {other}"),
            },
        }
    }

    let result = workflow.finish(session).await;
    print_result(&result);
    Ok(())
}

fn print_question(session: &QuizSession) {
    let question = session.current_question();
    println!(
        "\nQ{}/{}  {}",
        session.current_idx() + 1,
        session.questions().len(),
        question.text
    );
    for (idx, option) in question.options.iter().enumerate() {
        let marker = if session.answer_at(session.current_idx()) == Some(idx) {
            '*'
        } else {
            ' '
        };
        println!(" {marker}({}) {option}", option_label(idx));
    }
}

fn print_feedback(session: &QuizSession) {
    let question = session.current_question();
    let chosen = session.answer_at(session.current_idx());
    if chosen == Some(question.correct) {
        println!("  Correct.");
    } else {
        println!(
            "  Wrong. The answer is ({}).",
            option_label(question.correct)
        );
    }
    println!("  {}", question.explanation);
}

fn print_result(result: &QuizResult) {
    println!("\n──────────────────────────────");
    println!(" {} ({})", result.subject, result.paper);
    println!(" Score     {:.2}", result.score);
    println!(
        " Correct   {}   Wrong {}   Skipped {}",
        result.correct, result.wrong, result.skipped
    );
    println!(" Accuracy  {}%", result.accuracy);
    println!("──────────────────────────────");

    let missed: Vec<_> = result
        .detail
        .iter()
        .filter(|review| review.attempted && !review.is_correct)
        .collect();
    if !missed.is_empty() {
        println!("\nReview your misses:");
        for review in missed {
            println!("\n  {}", review.question.text);
            let answer_text = review
                .question
                .options
                .get(review.question.correct)
                .map_or("", String::as_str);
            println!(
                "  Answer: ({}) {answer_text}",
                option_label(review.question.correct)
            );
            if !review.question.explanation.is_empty() {
                println!("  {}", review.question.explanation);
            }
        }
    }
}

fn print_subjects() {
    for paper in [Paper::Gs1, Paper::Csat] {
        println!("{paper}:");
        for subject in catalog::subjects_for(paper) {
            println!("  {:<12} {}", subject.id, subject.name);
        }
    }
}

fn print_history(history: &[QuizResult]) {
    if history.is_empty() {
        println!("No results yet.");
        return;
    }
    for result in history {
        let when = result
            .saved_at
            .map_or_else(|| "unknown".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{when}  {:<20} {:>6.2}  {}% accuracy ({}/{} attempted)",
            result.subject, result.score, result.accuracy, result.correct, result.attempted
        );
    }
}

fn parse_option(input: &str, available: usize) -> Option<usize> {
    let mut chars = input.chars();
    let letter = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() {
        return None;
    }
    let idx = OPTION_LABELS.iter().position(|&label| label == letter)?;
    (idx < available).then_some(idx)
}

fn prompt(message: &str) -> String {
    print!("{message}");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
    line.trim().to_string()
}

fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url.strip_prefix("sqlite://").unwrap_or(db_url);
    let path = path.split('?').next().unwrap_or(path);
    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_letters_map_to_indices() {
        assert_eq!(parse_option("a", 4), Some(0));
        assert_eq!(parse_option("D", 4), Some(3));
        assert_eq!(parse_option("e", 4), None);
        assert_eq!(parse_option("ab", 4), None);
        assert_eq!(parse_option("1", 4), None);
    }

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(720), "12:00");
    }

    #[test]
    fn relative_db_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("prelims.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("prelims.sqlite3"));

        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/a.db".into()),
            "sqlite:///tmp/a.db"
        );
    }
}
