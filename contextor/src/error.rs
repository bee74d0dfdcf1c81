//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate (index, embedding, query).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// The generative model failed, timed out or is unreachable.
    #[error("generation service error: {0}")]
    Generation(#[from] ai_llm_service::AiLlmError),

    /// The prompt template failed to render.
    #[error("prompt template error: {0}")]
    Template(#[from] minijinja::Error),
}
