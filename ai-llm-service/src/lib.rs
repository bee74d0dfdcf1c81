//! Shared LLM service used by the chatbot for text generation and embeddings.
//!
//! The crate hides three HTTP backends (Gemini, OpenAI-compatible, Ollama)
//! behind [`service_profiles::LlmServiceProfiles`], which owns two logical
//! profiles: **generation** (answer synthesis) and **embedding** (indexing and
//! query-time retrieval). Generation calls are guarded by a timeout and a
//! bounded retry policy for transient failures.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod retry;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::default_config::{config_embedding_from_env, config_generation_from_env};
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, HealthError, ProviderError, ProviderErrorKind};
pub use health_service::{HealthService, HealthStatus};
pub use retry::RetryPolicy;
pub use service_profiles::LlmServiceProfiles;
