//! FAQ retrieval store: corpus loading, indexing and nearest-answer lookup.
//!
//! This crate provides a clean API to:
//! - Load the admissions FAQ from CSV and embed every question
//! - Persist the embeddings as a flat index artifact and load it back
//! - Retrieve the top‑K closest FAQ answers for a textual query
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod corpus;
mod embed;
mod embed_pool;
mod errors;
mod index;
mod indexer;
mod normalize;
mod record;
mod retrieve;

pub use config::{INDEX_FILE_NAME, RagConfig};
pub use corpus::{load_corpus, read_corpus};
pub use embed::{EmbeddingsProvider, hashing::HashingEmbedder, service::ServiceEmbedder};
pub use errors::RagError;
pub use index::{FaqIndex, INDEX_FORMAT_VERSION};
pub use indexer::{build_index, index_corpus};
pub use record::{FaqRecord, IndexedEntry, RagHit, RagQuery};
pub use retrieve::rag_context;

use tracing::{debug, trace, warn};

/// High-level facade over a loaded index.
///
/// Read-only after construction; share it across request handlers via `Arc`.
pub struct RagStore {
    cfg: RagConfig,
    index: FaqIndex,
}

impl RagStore {
    /// Loads the index from `cfg.index_dir`.
    ///
    /// # Errors
    /// - [`RagError::IndexNotFound`] if no usable artifact exists
    /// - [`RagError::Config`] if the artifact was built with another embedding model
    /// - any error from [`FaqIndex::load`]
    pub fn open(cfg: RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;
        trace!(dir = %cfg.index_dir.display(), "RagStore::open");
        let index = FaqIndex::load(&cfg.index_dir)?;
        Self::from_index(cfg, index)
    }

    /// Wraps an already-built index.
    ///
    /// # Errors
    /// [`RagError::Config`] on an embedding model or dimension mismatch.
    pub fn from_index(cfg: RagConfig, index: FaqIndex) -> Result<Self, RagError> {
        if index.embedding_model() != cfg.embedding_model {
            warn!(
                index_model = index.embedding_model(),
                configured = %cfg.embedding_model,
                "index was built with another embedding model"
            );
            return Err(RagError::Config(format!(
                "index built with embedding model `{}` but `{}` is configured; rebuild the index",
                index.embedding_model(),
                cfg.embedding_model
            )));
        }
        if let Some(want) = cfg.embedding_dim {
            if index.dimension() != want {
                return Err(RagError::VectorSizeMismatch {
                    got: index.dimension(),
                    want,
                });
            }
        }
        Ok(Self { cfg, index })
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub fn index(&self) -> &FaqIndex {
        &self.index
    }

    /// Number of indexed FAQ entries (always > 0).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Builds RAG context for a textual query using the provided embedding provider.
    ///
    /// # Errors
    /// See [`rag_context`].
    pub async fn rag_context(
        &self,
        query: RagQuery<'_>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<RagHit>, RagError> {
        debug!(top_k = query.top_k, "RagStore::rag_context");
        retrieve::rag_context(&self.index, provider, query).await
    }
}
