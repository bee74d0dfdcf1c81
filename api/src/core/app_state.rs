use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use contextor::{AskOptions, Contextor, ContextorConfig, TextGenerator};
use rag_store::{EmbeddingsProvider, RagConfig, RagStore};
use session_store::SessionStore;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error_handler::AppError;

/// Everything needed to (re)open the FAQ index and build the ask pipeline.
pub struct EngineParts {
    pub rag: RagConfig,
    pub embedder: Arc<dyn EmbeddingsProvider>,
    pub generator: Arc<dyn TextGenerator>,
    pub contextor: ContextorConfig,
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub sessions: SessionStore,
    /// Provider profiles for `/health`; `None` when running with in-process fakes.
    pub llm: Option<Arc<LlmServiceProfiles>>,
    pub ask_opts: AskOptions,
    parts: EngineParts,
    engine: RwLock<Option<Arc<Contextor>>>,
}

impl AppState {
    /// Builds the state and tries to load the index once.
    ///
    /// A missing index is not fatal: the server starts and every question is
    /// answered with `INDEX_NOT_FOUND` until an index appears on disk.
    pub fn new(
        sessions: SessionStore,
        parts: EngineParts,
        llm: Option<Arc<LlmServiceProfiles>>,
    ) -> Self {
        let engine = match open_engine(&parts) {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "starting without a FAQ index");
                None
            }
        };
        Self {
            sessions,
            llm,
            ask_opts: AskOptions::default(),
            parts,
            engine: RwLock::new(engine),
        }
    }

    /// The ask pipeline, loading the index on first use if it was missing.
    pub async fn engine(&self) -> Result<Arc<Contextor>, AppError> {
        if let Some(e) = self.engine.read().await.as_ref() {
            return Ok(e.clone());
        }
        let mut w = self.engine.write().await;
        if let Some(e) = w.as_ref() {
            return Ok(e.clone());
        }
        let e = open_engine(&self.parts)?;
        info!(entries = e.store().len(), "FAQ index loaded on demand");
        *w = Some(e.clone());
        Ok(e)
    }

    /// Entry count of the loaded index, if any.
    pub async fn index_entries(&self) -> Option<usize> {
        self.engine.read().await.as_ref().map(|e| e.store().len())
    }

    pub fn index_dir(&self) -> &std::path::Path {
        &self.parts.rag.index_dir
    }
}

fn open_engine(parts: &EngineParts) -> Result<Arc<Contextor>, AppError> {
    let store = RagStore::open(parts.rag.clone())?;
    Ok(Arc::new(Contextor::new(
        Arc::new(store),
        parts.embedder.clone(),
        parts.generator.clone(),
        parts.contextor,
    )))
}
