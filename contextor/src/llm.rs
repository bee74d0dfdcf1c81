//! Text generation seam and the synthesis step.

use std::{future::Future, pin::Pin};

use ai_llm_service::{AiLlmError, LlmServiceProfiles};
use tracing::{debug, error};

use crate::error::ContextorError;
use crate::prompt::build_prompt;

/// Anything that turns a prompt into a completion.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;
}

/// Generation profile of the shared LLM service (with timeout and retry).
impl TextGenerator for LlmServiceProfiles {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
        Box::pin(LlmServiceProfiles::generate(self, prompt, None))
    }
}

/// Fills the prompt with `references` and `query` and returns the model text
/// unmodified.
///
/// # Errors
/// [`ContextorError::Generation`] if the model call fails.
pub async fn synthesize(
    generator: &dyn TextGenerator,
    references: &[&str],
    query: &str,
) -> Result<String, ContextorError> {
    let prompt = build_prompt(references, query)?;
    debug!(
        prompt_len = prompt.len(),
        references = references.len(),
        "synthesizing answer"
    );
    generator.generate(&prompt).await.map_err(|e| {
        error!(error = %e, "generation failed");
        ContextorError::Generation(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::ConfigError;

    struct Echo;

    impl TextGenerator for Echo {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
            Box::pin(async move { Ok(prompt.to_string()) })
        }
    }

    struct Down;

    impl TextGenerator for Down {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
            Box::pin(async { Err(ConfigError::MissingVar("GEMINI_API_KEY").into()) })
        }
    }

    #[tokio::test]
    async fn passes_filled_template_to_the_model() {
        let out = synthesize(&Echo, &["March 31."], "When is the deadline?")
            .await
            .unwrap();
        assert!(out.contains("March 31."));
        assert!(out.contains("When is the deadline?"));
    }

    #[tokio::test]
    async fn model_failure_is_generation_error() {
        let err = synthesize(&Down, &["x"], "y").await.unwrap_err();
        assert!(matches!(err, ContextorError::Generation(_)));
    }
}
