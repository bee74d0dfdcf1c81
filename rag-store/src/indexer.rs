//! Indexing pipeline: read CSV → normalize → embed questions → persist index.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::corpus::load_corpus;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_all;
use crate::errors::RagError;
use crate::index::FaqIndex;
use crate::record::{FaqRecord, IndexedEntry};

/// Embeds every record's question and builds the in-memory index.
///
/// Entries keep corpus order. Nothing is written to disk.
///
/// # Errors
/// - [`RagError::EmptyCorpus`] if `records` is empty
/// - [`RagError::Embedding`] on the first provider failure (no retry)
/// - [`RagError::VectorSizeMismatch`] on inconsistent dimensions
pub async fn build_index(
    records: &[FaqRecord],
    provider: &dyn EmbeddingsProvider,
    cfg: &RagConfig,
    pb: &ProgressBar,
) -> Result<FaqIndex, RagError> {
    if records.is_empty() {
        warn!("refusing to build an index from an empty corpus");
        return Err(RagError::EmptyCorpus);
    }

    let questions: Vec<&str> = records.iter().map(FaqRecord::question).collect();
    let vectors = embed_all(
        &questions,
        provider,
        cfg.embedding_dim,
        cfg.embedding_concurrency,
        pb,
    )
    .await?;

    let entries = records
        .iter()
        .zip(vectors)
        .map(|(r, embedding)| IndexedEntry {
            embedding,
            answer: r.answer().to_string(),
            source_question: r.question().to_string(),
        })
        .collect();

    FaqIndex::new(cfg.embedding_model.clone(), entries)
}

/// Batch job: load the CSV, build the index and save it under `cfg.index_dir`.
///
/// Any failure aborts the job before the artifact is replaced.
///
/// # Errors
/// See [`load_corpus`], [`build_index`] and [`FaqIndex::save`].
pub async fn index_corpus(
    csv_path: impl AsRef<Path>,
    provider: &dyn EmbeddingsProvider,
    cfg: &RagConfig,
    show_progress: bool,
) -> Result<(PathBuf, usize), RagError> {
    cfg.validate()?;
    let records = load_corpus(csv_path.as_ref())?;

    let pb = if show_progress {
        progress_bar(records.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let index = match build_index(&records, provider, cfg, &pb).await {
        Ok(i) => i,
        Err(e) => {
            pb.abandon_with_message("indexing failed");
            return Err(e);
        }
    };
    pb.finish_with_message("embedding complete");

    let path = index.save(&cfg.index_dir)?;
    info!(
        csv = %csv_path.as_ref().display(),
        index = %path.display(),
        entries = index.len(),
        "FAQ corpus indexed"
    );
    Ok((path, index.len()))
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}
