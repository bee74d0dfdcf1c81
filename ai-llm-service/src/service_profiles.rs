//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - Generation is wrapped in a [`RetryPolicy`]; embeddings are not retried
//!   (indexing aborts on the first failure).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmServiceProfiles, RetryPolicy};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let generation = ai_llm_service::config_generation_from_env()?;
//! let embedding = ai_llm_service::config_embedding_from_env()?;
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     generation,
//!     embedding,
//!     RetryPolicy::default(),
//!     Some(10),
//! )?);
//!
//! let emb = svc.embed("Hạn nộp hồ sơ?").await?;
//! println!("Embedding dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    config::{
        default_config::{config_embedding_from_env, config_generation_from_env},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, ConfigError},
    health_service::{HealthService, HealthStatus},
    retry::RetryPolicy,
    services::{
        gemini_service::GeminiService, ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
};

/// A constructed provider client.
#[derive(Debug)]
enum ProviderClient {
    Ollama(OllamaService),
    OpenAI(OpenAiService),
    Gemini(GeminiService),
}

impl ProviderClient {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(match cfg.provider {
            LlmProvider::Ollama => ProviderClient::Ollama(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAI => ProviderClient::OpenAI(OpenAiService::new(cfg.clone())?),
            LlmProvider::Gemini => ProviderClient::Gemini(GeminiService::new(cfg.clone())?),
        })
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        match self {
            ProviderClient::Ollama(c) => c.generate(prompt, system).await,
            ProviderClient::OpenAI(c) => c.generate(prompt, system).await,
            ProviderClient::Gemini(c) => c.generate(prompt, system).await,
        }
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self {
            ProviderClient::Ollama(c) => c.embeddings(input).await,
            ProviderClient::OpenAI(c) => c.embeddings(input).await,
            ProviderClient::Gemini(_) => Err(ConfigError::UnsupportedProfile {
                provider: LlmProvider::Gemini.to_string(),
                profile: "embeddings",
            }
            .into()),
        }
    }
}

/// Shared service that manages the **generation** and **embedding** profiles.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,
    retry: RetryPolicy,

    clients: RwLock<HashMap<ClientKey, Arc<ProviderClient>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service with both profiles.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedProfile`] if the embedding provider cannot embed
    /// - [`AiLlmError::HttpTransport`] if the health client cannot be built
    pub fn new(
        generation: LlmModelConfig,
        embedding: LlmModelConfig,
        retry: RetryPolicy,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        if !embedding.provider.supports_embeddings() {
            return Err(ConfigError::UnsupportedProfile {
                provider: embedding.provider.to_string(),
                profile: "embeddings",
            }
            .into());
        }

        info!(
            generation_provider = %generation.provider,
            generation_model = %generation.model,
            embedding_provider = %embedding.provider,
            embedding_model = %embedding.model,
            max_retries = retry.max_retries,
            "LLM service profiles configured"
        );

        Ok(Self {
            generation,
            embedding,
            retry,
            clients: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds both profiles and the retry policy from environment variables.
    pub fn from_env() -> Result<Self, AiLlmError> {
        let generation = config_generation_from_env()?;
        let embedding = config_embedding_from_env()?;
        let retry = RetryPolicy::from_env(generation.timeout_secs)?;
        Self::new(generation, embedding, retry, Some(10))
    }

    /// Generates text with the **generation** profile.
    ///
    /// Each attempt is bounded by the policy timeout; transient failures are
    /// retried with backoff.
    ///
    /// # Errors
    /// Returns the last [`AiLlmError`] if all attempts fail.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let cli = self.client_for(&self.generation).await?;
        self.retry
            .run("generate", || cli.generate(prompt, system))
            .await
    }

    /// Computes an embedding with the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the call fails; no retry.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cli = self.client_for(&self.embedding).await?;
        cli.embed(input).await
    }

    /// Returns a health snapshot for both profiles (once if they are equal).
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.generation.clone()];
        if self.embedding != self.generation {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn client_for(&self, cfg: &LlmModelConfig) -> Result<Arc<ProviderClient>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.clients.read().await.get(&key).cloned() {
            return Ok(cli);
        }

        let mut w = self.clients.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        debug!(provider = %cfg.provider, model = %cfg.model, "initializing provider client");
        let cli = Arc::new(ProviderClient::build(cfg)?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
