//! Default LLM configs loaded from environment variables.
//!
//! Two roles are used by the chatbot:
//!
//! - **Generation** → answers questions from the retrieved FAQ reference
//! - **Embedding**  → embeds FAQ questions at index time and user questions at query time
//!
//! # Environment variables
//!
//! Generation:
//! - `LLM_KIND` = `gemini` (default) | `openai` | `ollama`
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = per-request timeout (default 60)
//! - Gemini: `GEMINI_API_KEY` (required), `GEMINI_MODEL` (default `gemini-2.0-flash`), `GEMINI_URL`
//! - OpenAI: `OPENAI_API_KEY` (required), `OPENAI_MODEL` (default `gpt-4o-mini`), `OPENAI_URL`
//! - Ollama: `OLLAMA_URL` or `OLLAMA_PORT`, `OLLAMA_MODEL` (required)
//!
//! Embedding:
//! - `EMBEDDING_KIND` = `ollama` (default) | `openai`
//! - `EMBEDDING_MODEL` (default `all-minilm`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, Result, env_opt_u32, env_opt_u64, must_env, opt_env,
    },
};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Resolves the Ollama endpoint from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
fn ollama_endpoint() -> Result<String> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Ok("http://localhost:11434".to_string())
}

fn provider_from_env(var: &'static str, default: LlmProvider) -> Result<LlmProvider> {
    match opt_env(var) {
        Some(v) => Ok(v.parse::<LlmProvider>()?),
        None => Ok(default),
    }
}

/// Builds the **generation** profile.
///
/// # Defaults
/// - `temperature = Some(0.4)`
/// - `timeout_secs = LLM_TIMEOUT_SECS` or 60
///
/// # Errors
/// - [`ConfigError::MissingVar`] when the chosen provider needs an API key or model that is unset
/// - [`ConfigError::UnsupportedProvider`] for unknown `LLM_KIND`
pub fn config_generation_from_env() -> Result<LlmModelConfig> {
    let provider = provider_from_env("LLM_KIND", LlmProvider::Gemini)?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    let (model, endpoint, api_key) = match provider {
        LlmProvider::Gemini => (
            opt_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            opt_env("GEMINI_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
            Some(must_env("GEMINI_API_KEY")?),
        ),
        LlmProvider::OpenAI => (
            opt_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            opt_env("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            Some(must_env("OPENAI_API_KEY")?),
        ),
        LlmProvider::Ollama => (must_env("OLLAMA_MODEL")?, ollama_endpoint()?, None),
    };

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.4),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Builds the **embedding** profile.
///
/// The same profile must be used at index time and at query time; a model
/// change requires rebuilding the index.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
pub fn config_embedding_from_env() -> Result<LlmModelConfig> {
    let provider = provider_from_env("EMBEDDING_KIND", LlmProvider::Ollama)?;
    if !provider.supports_embeddings() {
        return Err(AiLlmError::Config(ConfigError::UnsupportedProfile {
            provider: provider.to_string(),
            profile: "embeddings",
        }));
    }

    let model = opt_env("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
    let (endpoint, api_key) = match provider {
        LlmProvider::OpenAI => (
            opt_env("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            Some(must_env("OPENAI_API_KEY")?),
        ),
        _ => (ollama_endpoint()?, None),
    };

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    };
    cfg.validate()?;
    Ok(cfg)
}
