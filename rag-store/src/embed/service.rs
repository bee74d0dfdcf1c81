//! Embedding provider backed by the shared LLM service (embedding profile).

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;
use tracing::error;

use crate::{EmbeddingsProvider, RagError};

/// Embeds text through [`LlmServiceProfiles::embed`].
#[derive(Clone)]
pub struct ServiceEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: Option<usize>,
}

impl ServiceEmbedder {
    /// `dim`, when set, is enforced on every returned vector.
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for ServiceEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await.map_err(|e| {
                error!(error = %e, "embedding call failed");
                RagError::from(e)
            })?;

            if let Some(want) = self.dim {
                if v.len() != want {
                    return Err(RagError::VectorSizeMismatch { got: v.len(), want });
                }
            }
            Ok(v)
        })
    }
}
