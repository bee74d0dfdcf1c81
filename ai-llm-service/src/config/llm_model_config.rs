use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{Result, validate_http_endpoint, validate_range_f32};

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which backend to use (Gemini, OpenAI, Ollama).
/// - `model`: The model identifier (e.g., `"gemini-2.0-flash"`, `"all-minilm"`).
/// - `endpoint`: Base URL of the API (no trailing route).
/// - `api_key`: API key for providers that require authentication.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Per-request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Gemini,
///     model: "gemini-2.0-flash".to_string(),
///     endpoint: "https://generativelanguage.googleapis.com".to_string(),
///     api_key: Some("from-env".to_string()),
///     max_tokens: Some(1024),
///     temperature: Some(0.4),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Base URL of the provider API.
    pub endpoint: String,

    /// Optional API key. Never logged.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Checks endpoint scheme, model name, and sampling ranges.
    ///
    /// # Errors
    /// Returns [`crate::AiLlmError::Config`] for the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(crate::ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }

    /// Endpoint without trailing slashes.
    pub(crate) fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}

// The API key must never leak into logs, so `Debug` is written by hand.
impl std::fmt::Debug for LlmModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "all-minilm".into(),
            endpoint: "http://localhost:11434/".into(),
            api_key: Some("secret-value".into()),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn debug_redacts_api_key() {
        let dbg = format!("{:?}", sample());
        assert!(!dbg.contains("secret-value"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        assert_eq!(sample().base_url(), "http://localhost:11434");
    }

    #[test]
    fn validate_rejects_bad_scheme_and_ranges() {
        let mut cfg = sample();
        cfg.endpoint = "localhost:11434".into();
        assert!(cfg.validate().is_err());

        let mut cfg = sample();
        cfg.top_p = Some(1.5);
        assert!(cfg.validate().is_err());

        let mut cfg = sample();
        cfg.model = "  ".into();
        assert!(cfg.validate().is_err());

        assert!(sample().validate().is_ok());
    }
}
