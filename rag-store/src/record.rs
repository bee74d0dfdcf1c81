//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// One question/answer row of the FAQ corpus.
///
/// Fields are private; a record is immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaqRecord {
    question: String,
    answer: String,
}

impl FaqRecord {
    /// Builds a record from already-trimmed, non-empty fields.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// A corpus record after indexing: the question embedding plus its answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub embedding: Vec<f32>,
    pub answer: String,
    pub source_question: String,
}

/// Query parameters for retrieval.
#[derive(Clone, Copy, Debug)]
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: usize,
}

/// A single retrieval hit, nearest first in result lists.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RagHit {
    /// Cosine similarity in `[-1, 1]`; higher is closer.
    pub score: f32,
    pub answer: String,
    pub source_question: String,
}
