//! Converts heterogeneous raw question-bank documents into the canonical
//! `Question` shape.
//!
//! Bank files in the wild disagree on almost everything: wrapper shape,
//! text keys, how the correct answer is written down. The normalizer
//! tolerates all of it by resolving each field through a strict priority
//! order with an independent default, so a structurally odd record never
//! aborts the batch.

use log::warn;
use serde_json::{Map, Value};

use prelims_core::Clock;
use prelims_core::model::{Question, QuestionMetadata};

/// Id prefix for records that arrive without one.
const SYNTHETIC_ID_NAMESPACE: &str = "upsc";

const MISSING_TEXT: &str = "Question content missing";
const MISSING_EXPLANATION: &str = "No explanation provided for this question.";
const DEFAULT_DIFFICULTY: &str = "Moderate";
const DEFAULT_TOPIC: &str = "General Studies";
const DEFAULT_EXAM: &str = "UPSC Prelims";
const DEFAULT_YEAR: &str = "N/A";

/// Output of one normalization pass.
///
/// `dropped` counts records that were not even object-shaped and had to be
/// discarded; it is diagnostic only and never turns the pass into a
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBank {
    pub questions: Vec<Question>,
    pub dropped: usize,
}

/// Pure transform from raw parsed JSON to canonical questions.
///
/// The clock only feeds the time component of synthesized ids, which keeps
/// ids stable within one pass and reproducible under a fixed clock.
pub struct Normalizer {
    clock: Clock,
}

impl Normalizer {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    /// Normalize a raw bank document.
    ///
    /// Accepts a bare list of records, an object wrapping one under a
    /// `questions` key, or a single bare record. Anything else yields an
    /// empty bank. Empty input yields empty output.
    #[must_use]
    pub fn normalize(&self, raw: &Value) -> NormalizedBank {
        let records: Vec<&Value> = match raw {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => match map.get("questions") {
                Some(Value::Array(items)) => items.iter().collect(),
                _ => vec![raw],
            },
            _ => Vec::new(),
        };

        let pass_millis = self.clock.now().timestamp_millis();
        let mut questions = Vec::with_capacity(records.len());
        let mut dropped = 0;

        for (index, record) in records.into_iter().enumerate() {
            match record.as_object() {
                Some(fields) => questions.push(normalize_record(fields, index, pass_millis)),
                None => {
                    warn!("bank record {index} is not an object, dropping it");
                    dropped += 1;
                }
            }
        }

        NormalizedBank { questions, dropped }
    }
}

fn normalize_record(fields: &Map<String, Value>, index: usize, pass_millis: i64) -> Question {
    let id = non_empty_string(fields.get("id"))
        .unwrap_or_else(|| format!("{SYNTHETIC_ID_NAMESPACE}_{pass_millis}_{index}"));

    // UPSC-specific key wins over the generic one
    let text = non_empty_string(fields.get("question_text"))
        .or_else(|| non_empty_string(fields.get("text")))
        .unwrap_or_else(|| MISSING_TEXT.to_string());

    let options = match fields.get("options") {
        Some(Value::Array(items)) => items.iter().map(option_text).collect(),
        _ => Vec::new(),
    };

    let correct = extract_correct(fields, &id);

    let explanation = non_empty_string(fields.get("explanation"))
        .unwrap_or_else(|| MISSING_EXPLANATION.to_string());

    Question {
        id,
        text,
        options,
        correct,
        explanation,
        metadata: normalize_metadata(fields),
    }
}

fn normalize_metadata(fields: &Map<String, Value>) -> QuestionMetadata {
    let source = fields.get("source").and_then(Value::as_object);
    // re-normalizing canonical output must not lose categorization, so the
    // nested metadata object acts as a fallback behind the flat keys
    let nested = fields.get("metadata").and_then(Value::as_object);
    let lookup = |key: &str| {
        fields
            .get(key)
            .or_else(|| nested.and_then(|meta| meta.get(key)))
    };

    let year = year_string(lookup("year"))
        .or_else(|| year_string(source.and_then(|s| s.get("year"))))
        .unwrap_or_else(|| DEFAULT_YEAR.to_string());

    let exam = source
        .and_then(|s| non_empty_string(s.get("exam")))
        .map(|exam| exam.replace('_', " "))
        .or_else(|| non_empty_string(nested.and_then(|meta| meta.get("exam"))))
        .unwrap_or_else(|| DEFAULT_EXAM.to_string());

    QuestionMetadata {
        year,
        exam,
        difficulty: non_empty_string(lookup("difficulty"))
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        topic: non_empty_string(lookup("topic")).unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
        subtopic: non_empty_string(lookup("subtopic")).unwrap_or_default(),
        tags: string_list(lookup("tags")),
        concepts: string_list(
            fields
                .get("linked_concepts")
                .or_else(|| nested.and_then(|meta| meta.get("concepts"))),
        ),
    }
}

/// Resolves the correct-answer index through the strict priority ladder:
/// numeric `correct_option_index`, numeric `correct`, then a letter label.
/// Falls back to index 0 with a diagnostic; that default marks suspect
/// data, not a verified answer.
fn extract_correct(fields: &Map<String, Value>, id: &str) -> usize {
    if let Some(index) = fields.get("correct_option_index").and_then(parse_index) {
        return index;
    }
    if let Some(index) = fields.get("correct").and_then(parse_index) {
        return index;
    }
    if let Some(index) = fields.get("correct_option_label").and_then(parse_label) {
        return index;
    }

    warn!("could not resolve correct answer for question {id}, defaulting to first option");
    0
}

/// Parses a non-negative integer index from a JSON number or numeric
/// string.
fn parse_index(value: &Value) -> Option<usize> {
    let parsed = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    usize::try_from(parsed).ok()
}

/// Maps a single-letter option label ("A"–"D", any case) to its index.
fn parse_label(value: &Value) -> Option<usize> {
    let label = value.as_str()?.trim().to_ascii_uppercase();
    match label.as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Years arrive as numbers or strings; downstream sorting and rendering
/// want exactly one representation.
fn year_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
