//! Embedding executor with bounded concurrency and dimension checks.

use crate::{embed::EmbeddingsProvider, errors::RagError};
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use tracing::{debug, info};

/// Embeds `texts` in order, at most `concurrency` calls in flight.
///
/// The output has one vector per input, in input order. All vectors share one
/// dimension: `expected_dim` when given, otherwise the first vector's size.
/// The first failure aborts the whole batch.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if dimensions disagree,
/// or [`RagError::Embedding`] if the provider fails.
pub async fn embed_all(
    texts: &[&str],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
    pb: &ProgressBar,
) -> Result<Vec<Vec<f32>>, RagError> {
    info!(
        total = texts.len(),
        concurrency, "embed_pool::embed_all"
    );

    let vectors: Vec<Vec<f32>> = stream::iter(texts.iter().copied())
        .map(|text| async move {
            let v = provider.embed(text).await?;
            pb.inc(1);
            Ok::<Vec<f32>, RagError>(v)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let want = match (expected_dim, vectors.first()) {
        (Some(d), _) => d,
        (None, Some(first)) => first.len(),
        (None, None) => return Ok(vectors),
    };
    if want == 0 {
        return Err(RagError::Embedding("provider returned an empty vector".into()));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
        return Err(RagError::VectorSizeMismatch {
            got: bad.len(),
            want,
        });
    }

    debug!(dim = want, "embed_pool::embed_all done");
    Ok(vectors)
}
