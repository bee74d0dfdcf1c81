use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Provider interface for embedding generation.
///
/// Async because real providers (Ollama, OpenAI) perform HTTP requests.
/// The same provider must be used to build the index and to embed queries.
pub trait EmbeddingsProvider: Send + Sync {
    /// Async embedding function.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;
}

pub mod hashing;
pub mod service;
