use serde::{Deserialize, Serialize};

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Canonical multiple-choice question, as produced by the normalizer.
///
/// Every field is guaranteed present after normalization; missing or
/// malformed source fields are replaced with documented defaults rather
/// than left out. Structural soundness (option count, answer index range)
/// is the validator's job, not an invariant of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique within one bank. Synthesized (`upsc_{millis}_{position}`)
    /// when the source record carries no id.
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    /// Index into `options`. An index-0 default from an unresolvable source
    /// field is suspect data, not a verified answer.
    pub correct: usize,
    pub explanation: String,
    #[serde(default)]
    pub metadata: QuestionMetadata,
}

/// Categorization attached to a question for analysis and review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionMetadata {
    /// Always a string, whatever the source type, so rendering and sorting
    /// downstream stay uniform.
    pub year: String,
    pub exam: String,
    pub difficulty: String,
    pub topic: String,
    pub subtopic: String,
    pub tags: Vec<String>,
    pub concepts: Vec<String>,
}
