use std::{fmt, str::FromStr};

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for LLM inference or embeddings.
///
/// The chatbot defaults to Gemini for answers and Ollama for embeddings, but
/// any profile can point at any backend that supports the operation.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmProvider;
///
/// let p: LlmProvider = "gemini".parse().unwrap();
/// assert_eq!(p, LlmProvider::Gemini);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// OpenAI or any OpenAI-compatible REST API.
    OpenAI,
    /// Google Gemini REST API (`generativelanguage.googleapis.com`).
    Gemini,
}

impl LlmProvider {
    /// Whether the provider can serve embedding requests through this crate.
    pub fn supports_embeddings(self) -> bool {
        matches!(self, LlmProvider::Ollama | LlmProvider::OpenAI)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "gemini",
        };
        f.write_str(s)
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
