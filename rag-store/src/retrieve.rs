//! Retrieval: embed the query and return the nearest FAQ entries.

use tracing::{debug, trace};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::index::FaqIndex;
use crate::record::{RagHit, RagQuery};

/// Embeds the query text and returns up to `top_k` hits, nearest first.
///
/// # Errors
/// - [`RagError::EmptyQuery`] if the text is blank
/// - [`RagError::Config`] if `top_k == 0`
/// - [`RagError::Embedding`] if the provider fails
/// - [`RagError::VectorSizeMismatch`] if the provider is not the one used to build the index
pub async fn rag_context(
    index: &FaqIndex,
    provider: &dyn EmbeddingsProvider,
    query: RagQuery<'_>,
) -> Result<Vec<RagHit>, RagError> {
    let text = query.text.trim();
    if text.is_empty() {
        return Err(RagError::EmptyQuery);
    }
    if query.top_k == 0 {
        return Err(RagError::Config("top_k must be > 0".into()));
    }
    trace!(top_k = query.top_k, query_len = text.len(), "retrieve::rag_context");

    let qv = provider.embed(text).await?;
    let hits: Vec<RagHit> = index
        .search(&qv, query.top_k)?
        .into_iter()
        .map(|(score, e)| RagHit {
            score,
            answer: e.answer.clone(),
            source_question: e.source_question.clone(),
        })
        .collect();

    debug!(
        hits = hits.len(),
        top_score = hits.first().map(|h| h.score),
        "retrieve::rag_context done"
    );
    Ok(hits)
}
