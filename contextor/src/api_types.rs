//! Public API types re-used by external crates (e.g., the HTTP API layer).

use serde::Serialize;

/// Options that control retrieval and prompt building for a single question.
///
/// Setting a field to `0` means: "use the value from [`ContextorConfig`](crate::ContextorConfig)".
///
/// # Example
/// ```
/// use contextor::AskOptions;
/// let opts = AskOptions { top_k: 2, context_k: 1 };
/// assert_eq!(opts.top_k, 2);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct AskOptions {
    /// Nearest FAQ entries to fetch.
    pub top_k: usize,
    /// How many of them go into the prompt, closest first.
    pub context_k: usize,
}

/// A FAQ entry that was placed in the prompt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsedReference {
    pub score: f32,
    pub source_question: String,
    pub answer: String,
}

/// Final answer together with the references passed to the model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub references: Vec<UsedReference>,
}
