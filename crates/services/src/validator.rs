//! Schema sanity gate between normalization and session start.

use prelims_core::model::Question;

use crate::error::ValidationError;

/// How many leading questions are checked. Banks run to thousands of
/// records; a deterministic prefix catches systematically broken files
/// without scanning everything.
pub const VALIDATED_PREFIX: usize = 10;

/// Most problems spelled out in the error; the rest become a count.
const PROBLEM_CAP: usize = 3;

/// Checks that a normalized bank is structurally able to back a session.
///
/// This is a hard gate: the session engine must not be handed a bank that
/// fails here.
///
/// # Errors
///
/// Returns `ValidationError` when the bank is empty or any checked
/// question has missing text, fewer than two options, or an out-of-range
/// correct index.
pub fn validate(questions: &[Question]) -> Result<(), ValidationError> {
    if questions.is_empty() {
        return Err(ValidationError {
            problems: vec!["question bank is empty".to_string()],
            remaining: 0,
        });
    }

    let mut problems = Vec::new();
    for (idx, question) in questions.iter().take(VALIDATED_PREFIX).enumerate() {
        let label = idx + 1;
        if question.text.trim().is_empty() {
            problems.push(format!("Q{label}: text missing"));
        }
        if question.options.len() < 2 {
            problems.push(format!(
                "Q{label}: needs at least 2 options, has {}",
                question.options.len()
            ));
        } else if question.correct >= question.options.len() {
            problems.push(format!(
                "Q{label}: correct index {} out of range for {} options",
                question.correct,
                question.options.len()
            ));
        }
    }

    if problems.is_empty() {
        return Ok(());
    }
    let remaining = problems.len().saturating_sub(PROBLEM_CAP);
    problems.truncate(PROBLEM_CAP);
    Err(ValidationError {
        problems,
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prelims_core::model::QuestionMetadata;

    fn question(text: &str, options: usize, correct: usize) -> Question {
        Question {
            id: "q".into(),
            text: text.into(),
            options: (0..options).map(|i| format!("opt {i}")).collect(),
            correct,
            explanation: String::new(),
            metadata: QuestionMetadata::default(),
        }
    }

    #[test]
    fn well_formed_bank_passes() {
        let bank: Vec<Question> = (0..20).map(|_| question("Q", 4, 2)).collect();
        assert!(validate(&bank).is_ok());
    }

    #[test]
    fn empty_bank_is_rejected() {
        let err = validate(&[]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn short_option_list_names_the_offender() {
        let mut bank: Vec<Question> = (0..10).map(|_| question("Q", 4, 0)).collect();
        bank[2] = question("Q", 1, 0);

        let err = validate(&bank).unwrap_err();
        assert_eq!(err.problems.len(), 1);
        assert!(err.problems[0].starts_with("Q3:"));
        assert_eq!(err.remaining, 0);
    }

    #[test]
    fn out_of_range_correct_index_is_rejected() {
        let bank = vec![question("Q", 4, 4), question("Q", 2, 0)];
        let err = validate(&bank).unwrap_err();
        assert!(err.problems[0].contains("out of range"));
    }

    #[test]
    fn problem_list_is_capped_with_a_remainder() {
        let bank: Vec<Question> = (0..10).map(|_| question("", 4, 0)).collect();
        let err = validate(&bank).unwrap_err();
        assert_eq!(err.problems.len(), 3);
        assert_eq!(err.remaining, 7);
    }

    #[test]
    fn problems_past_the_prefix_are_not_scanned() {
        let mut bank: Vec<Question> = (0..30).map(|_| question("Q", 4, 0)).collect();
        bank[25] = question("", 0, 0);
        assert!(validate(&bank).is_ok());
    }
}
