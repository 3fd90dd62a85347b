//! Lesson content data model and the boundary decoder for the service's
//! delimiter encoding.
//!
//! The remote service transports explanation and example material as
//! two-level delimited strings (`"日本語||translation;日本語||translation"`).
//! That encoding is decoded exactly once, here, into typed pairs; nothing
//! downstream ever re-parses a delimiter.

use serde::{Deserialize, Serialize};

/// Separates entries within an encoded content field.
pub const ENTRY_DELIMITER: char = ';';

/// Separates the primary text from its translation within one entry.
pub const FIELD_DELIMITER: &str = "||";

// ============================================================================
// LessonSummary
// ============================================================================

/// One entry in the lesson menu listing. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSummary {
    /// Lesson identifier (1-indexed).
    pub id: u32,
    /// Display title.
    pub title: String,
}

// ============================================================================
// ExamplePair and LessonContent
// ============================================================================

/// A primary/secondary text pair decoded from the wire encoding,
/// e.g. a Japanese sentence and its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    /// The primary text (target language).
    pub primary: String,
    /// The secondary text (translation); may be empty if the entry
    /// carried no second field.
    pub secondary: String,
}

/// Generated material for one lesson.
///
/// Empty `explanation`/`examples` are a valid, meaningful state: the
/// service has not generated this lesson yet. Content is replaced
/// wholesale on regeneration, never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    /// Lesson identifier.
    pub id: u32,
    /// Display title.
    pub title: String,
    /// Explanation entries; empty until generated.
    pub explanation: Vec<ExamplePair>,
    /// Example sentences; empty until generated.
    pub examples: Vec<ExamplePair>,
    /// Candidate prompts for the situational Q&A step.
    pub quiz_prompts: Vec<String>,
}

impl LessonContent {
    /// Returns `true` once the expensive generation pass has produced
    /// an explanation for this lesson.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        !self.explanation.is_empty()
    }

    /// Merges a newer response into this content, keeping rendering
    /// monotonic: a field that is already populated is never blanked by
    /// a later response that omits it.
    pub fn absorb(&mut self, newer: Self) {
        self.id = newer.id;
        if !newer.title.is_empty() {
            self.title = newer.title;
        }
        if !newer.explanation.is_empty() {
            self.explanation = newer.explanation;
        }
        if !newer.examples.is_empty() {
            self.examples = newer.examples;
        }
        if !newer.quiz_prompts.is_empty() {
            self.quiz_prompts = newer.quiz_prompts;
        }
    }
}

// ============================================================================
// Wire decoding
// ============================================================================

/// Decodes a two-level delimited field into typed pairs.
///
/// An empty or whitespace-only input yields an empty vector ("not yet
/// generated"). Entries without a `||` separator keep their full text as
/// the primary and an empty secondary.
///
/// # Examples
///
/// ```
/// use kotoba_core::content::decode_pairs;
///
/// let pairs = decode_pairs("猫が好きです||I like cats;犬も好き||I like dogs too");
/// assert_eq!(pairs.len(), 2);
/// assert_eq!(pairs[0].primary, "猫が好きです");
/// assert_eq!(pairs[0].secondary, "I like cats");
///
/// assert!(decode_pairs("").is_empty());
/// ```
#[must_use]
pub fn decode_pairs(raw: &str) -> Vec<ExamplePair> {
    raw.split(ENTRY_DELIMITER)
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (primary, secondary) = match entry.split_once(FIELD_DELIMITER) {
                Some((p, s)) => (p.trim(), s.trim()),
                None => (entry, ""),
            };
            Some(ExamplePair {
                primary: primary.to_string(),
                secondary: secondary.to_string(),
            })
        })
        .collect()
}

/// Decodes a single-level delimited field into prompt strings, dropping
/// empty entries.
#[must_use]
pub fn decode_prompts(raw: &str) -> Vec<String> {
    raw.split(ENTRY_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// ExerciseStep
// ============================================================================

/// The four rendered steps of a lesson, in their fixed order.
///
/// `Explanation` is always first and `Qa` always last; completing `Qa`
/// ends the lesson (there is no rendered "done" step).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStep {
    /// Reading the generated explanation and examples.
    #[default]
    Explanation,
    /// Free-form sentence composition.
    Free,
    /// Sentence composition using fetched vocabulary hints.
    Vocab,
    /// Answering one randomly selected situational prompt.
    Qa,
}

impl ExerciseStep {
    /// Returns the step that follows this one, or `None` after `Qa`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Explanation => Some(Self::Free),
            Self::Free => Some(Self::Vocab),
            Self::Vocab => Some(Self::Qa),
            Self::Qa => None,
        }
    }

    /// Returns `true` for steps that require a graded submission to leave.
    #[must_use]
    pub const fn is_graded(self) -> bool {
        !matches!(self, Self::Explanation)
    }

    /// The step name used in the verification envelope.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Explanation => "explanation",
            Self::Free => "free",
            Self::Vocab => "vocab",
            Self::Qa => "qa",
        }
    }
}

impl std::fmt::Display for ExerciseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ============================================================================
// VerificationResult and VocabHint
// ============================================================================

/// The grading service's verdict on one submitted sentence.
///
/// Consumed once per submission; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether the sentence passed.
    pub is_correct: bool,
    /// Feedback text shown to the learner.
    #[serde(default)]
    pub feedback: String,
    /// A cleaned-up version of the sentence, if the service offered one.
    #[serde(default)]
    pub refined_sentence: String,
}

/// A vocabulary suggestion for the `Vocab` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabHint {
    /// The suggested word.
    pub word: String,
    /// Reading in kana; may be empty.
    #[serde(default)]
    pub furigana: String,
    /// Meaning gloss.
    #[serde(default)]
    pub meaning: String,
}
