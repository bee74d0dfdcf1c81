//! RAG answer synthesizer for the admissions FAQ.
//!
//! Public API: [`Contextor::ask`]. It embeds the question, retrieves the
//! nearest FAQ entries from `rag-store`, keeps the closest `context_k` of
//! them, fills the admissions prompt template and calls the generation
//! profile.

mod api_types;
mod cfg;
mod error;
mod llm;
mod progress;
mod prompt;

pub use api_types::{AskOptions, QaAnswer, UsedReference};
pub use cfg::ContextorConfig;
pub use error::ContextorError;
pub use llm::{TextGenerator, synthesize};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use prompt::{PROMPT_TEMPLATE, build_prompt};

use std::sync::Arc;

use rag_store::{EmbeddingsProvider, RagQuery, RagStore};
use tracing::{debug, info};

/// Request-time pipeline wiring: loaded index, embedder and generator.
///
/// Cheap to share behind `Arc`; holds no per-request state.
pub struct Contextor {
    store: Arc<RagStore>,
    embedder: Arc<dyn EmbeddingsProvider>,
    generator: Arc<dyn TextGenerator>,
    cfg: ContextorConfig,
}

impl Contextor {
    pub fn new(
        store: Arc<RagStore>,
        embedder: Arc<dyn EmbeddingsProvider>,
        generator: Arc<dyn TextGenerator>,
        cfg: ContextorConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            cfg,
        }
    }

    pub fn store(&self) -> &RagStore {
        &self.store
    }

    /// Answers `question` without progress output.
    ///
    /// # Errors
    /// - [`ContextorError::Rag`] for an empty question or a failed embedding call
    /// - [`ContextorError::Generation`] if the model call fails
    pub async fn ask(&self, question: &str, opts: AskOptions) -> Result<QaAnswer, ContextorError> {
        self.ask_with_progress(question, opts, &NoopProgress).await
    }

    /// Answers `question`, reporting pipeline steps to `prog`.
    ///
    /// Any `AskOptions` field set to `0` is replaced by the configured value.
    pub async fn ask_with_progress(
        &self,
        question: &str,
        opts: AskOptions,
        prog: &dyn Progress,
    ) -> Result<QaAnswer, ContextorError> {
        let res = self.run(question, opts, prog).await;
        match &res {
            Ok(_) => prog.finish("done"),
            Err(e) => prog.fail(&e.to_string()),
        }
        res
    }

    async fn run(
        &self,
        question: &str,
        opts: AskOptions,
        prog: &dyn Progress,
    ) -> Result<QaAnswer, ContextorError> {
        let top_k = if opts.top_k == 0 {
            self.cfg.initial_top_k
        } else {
            opts.top_k
        };
        let context_k = if opts.context_k == 0 {
            self.cfg.context_k
        } else {
            opts.context_k
        };

        // 1) Retrieve
        prog.step("embedding + retrieving");
        let query = RagQuery {
            text: question,
            top_k,
        };
        let mut hits = self.store.rag_context(query, self.embedder.as_ref()).await?;
        hits.truncate(context_k);
        debug!(top_k, context_k, used = hits.len(), "references selected");
        if let Some(best) = hits.first() {
            prog.message(&format!("closest FAQ: {} ({:.3})", best.source_question, best.score));
        }

        // 2) Prompt + generate
        prog.step("generating answer");
        let refs: Vec<&str> = hits.iter().map(|h| h.answer.as_str()).collect();
        let answer = synthesize(self.generator.as_ref(), &refs, question.trim()).await?;

        info!(
            question_len = question.len(),
            answer_len = answer.len(),
            top_score = hits.first().map(|h| h.score),
            "question answered"
        );

        let references = hits
            .into_iter()
            .map(|h| UsedReference {
                score: h.score,
                source_question: h.source_question,
                answer: h.answer,
            })
            .collect();
        Ok(QaAnswer { answer, references })
    }
}
