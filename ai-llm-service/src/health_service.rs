//! Health probes for the configured LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth
//! - Gemini: `GET {endpoint}/v1beta/models/{model}` with `x-goog-api-key`
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] never fails (errors mapped to `ok=false`).

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet, parse_retry_after};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "gemini", "ollama").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks health for a single config, routing to the provider-specific probe.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            warn!(provider = %cfg.provider, endpoint = %cfg.endpoint, "invalid endpoint");
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = self.try_probe(cfg).await;
        let latency_ms = start.elapsed().as_millis();

        match result {
            Ok(message) => {
                info!(provider = %cfg.provider, model = %cfg.model, latency_ms, "health probe completed");
                HealthStatus::new(cfg, true, latency_ms, message)
            }
            Err(err) => {
                warn!(provider = %cfg.provider, model = %cfg.model, latency_ms, error = %err, "health probe failed");
                HealthStatus::new(cfg, false, latency_ms, err.to_string())
            }
        }
    }

    /// Checks health for multiple configs.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Strict probe. Returns a message on success, an error on hard failures.
    async fn try_probe(&self, cfg: &LlmModelConfig) -> Result<String, AiLlmError> {
        let base = cfg.base_url();
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout);

        let req = match cfg.provider {
            LlmProvider::Ollama => self.client.get(format!("{base}/api/tags")),
            LlmProvider::OpenAI => {
                let key = cfg.api_key.as_deref().ok_or_else(|| {
                    HealthError::Decode("missing OpenAI API key".into())
                })?;
                self.client
                    .get(format!("{base}/v1/models"))
                    .header(header::AUTHORIZATION, format!("Bearer {key}"))
            }
            LlmProvider::Gemini => {
                let key = cfg.api_key.as_deref().ok_or_else(|| {
                    HealthError::Decode("missing Gemini API key".into())
                })?;
                self.client
                    .get(format!("{base}/v1beta/models/{}", cfg.model))
                    .header("x-goog-api-key", key)
            }
        };

        debug!(provider = %cfg.provider, endpoint = %cfg.endpoint, "health probe GET");
        let resp = req.timeout(timeout).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = resp.url().path().to_string();
            let retry_after = parse_retry_after(resp.headers());
            let text = resp.text().await.unwrap_or_default();
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
                retry_after,
            })
            .into());
        }

        match cfg.provider {
            LlmProvider::Ollama => {
                let tags: OllamaTags = resp
                    .json()
                    .await
                    .map_err(|e| HealthError::Decode(e.to_string()))?;
                Ok(ollama_message(&tags, &cfg.model)?)
            }
            LlmProvider::OpenAI => {
                let models: OpenAiModels = resp
                    .json()
                    .await
                    .map_err(|e| HealthError::Decode(e.to_string()))?;
                if models.data.iter().any(|m| m.id == cfg.model) {
                    Ok("OpenAI is healthy; model is available".into())
                } else {
                    Err(HealthError::Decode("model not found in /v1/models".into()).into())
                }
            }
            LlmProvider::Gemini => Ok("Gemini is healthy; model is available".into()),
        }
    }
}

#[derive(serde::Deserialize)]
struct OllamaTag {
    name: String,
}

#[derive(serde::Deserialize)]
struct OllamaTags {
    models: Option<Vec<OllamaTag>>,
}

#[derive(serde::Deserialize)]
struct OpenAiModel {
    id: String,
}

#[derive(serde::Deserialize)]
struct OpenAiModels {
    data: Vec<OpenAiModel>,
}

/// Ollama tags may carry an implicit `:latest` suffix.
fn ollama_message(tags: &OllamaTags, model: &str) -> Result<String, HealthError> {
    let Some(models) = &tags.models else {
        return Ok("Ollama is healthy; tags response without `models` field".into());
    };
    let found = models
        .iter()
        .any(|m| m.name == model || m.name == format!("{model}:latest"));
    if found {
        Ok("Ollama is healthy; model is available".into())
    } else {
        Err(HealthError::Decode(format!(
            "Ollama is up, but model `{model}` is not pulled"
        )))
    }
}
