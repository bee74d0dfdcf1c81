//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors of the index artifact.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Malformed FAQ corpus (missing header columns, broken rows).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across entries or against the query.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// The corpus produced no usable records; nothing is indexed.
    #[error("corpus is empty: no question/answer rows to index")]
    EmptyCorpus,

    /// The query text is empty after trimming.
    #[error("query is empty")]
    EmptyQuery,

    /// No usable index artifact at the given location.
    #[error("index not found at {}", .0.display())]
    IndexNotFound(PathBuf),

    /// The embedding backend failed or is unreachable.
    #[error("embedding service error: {0}")]
    Embedding(String),
}

impl From<ai_llm_service::AiLlmError> for RagError {
    fn from(e: ai_llm_service::AiLlmError) -> Self {
        RagError::Embedding(e.to_string())
    }
}
