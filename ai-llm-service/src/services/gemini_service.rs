//! Google Gemini service for text generation.
//!
//! Calls `POST {endpoint}/v1beta/models/{model}:generateContent` with the API
//! key passed in the `x-goog-api-key` header, so the key never appears in a
//! URL or a log line.

use std::time::Instant;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{request_timeout, status_error},
};

/// Thin client for the Gemini REST API.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Gemini
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let mut key = header::HeaderValue::from_str(&api_key).map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        key.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .timeout(request_timeout(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        let url_generate = format!(
            "{}/v1beta/models/{}:generateContent",
            cfg.base_url(),
            cfg.model
        );

        info!(model = %cfg.model, endpoint = %cfg.endpoint, "GeminiService initialized");

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }

    /// Single-turn, non-streaming `generateContent`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, prompt, system);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = status_error(Provider::Gemini, &self.url_generate, resp).await;
            error!(
                error = %err,
                latency_ms = started.elapsed().as_millis(),
                "Gemini generateContent returned non-success status"
            );
            return Err(err.into());
        }

        let out: GenerateContentResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `candidates[0].content.parts[].text`"
                )),
            )
        })?;

        let text = extract_text(out)?;
        info!(
            latency_ms = started.elapsed().as_millis(),
            "generateContent completed"
        );
        Ok(text)
    }
}

/// Concatenates all text parts of the first candidate.
fn extract_text(resp: GenerateContentResponse) -> Result<String, ProviderError> {
    let parts = resp
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        Err(ProviderError::new(
            Provider::Gemini,
            ProviderErrorKind::EmptyChoices,
        ))
    } else {
        Ok(text)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let generation_config =
            if cfg.temperature.is_some() || cfg.top_p.is_some() || cfg.max_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: cfg.temperature,
                    top_p: cfg.top_p,
                    max_output_tokens: cfg.max_tokens,
                })
            } else {
                None
            };

        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part { text: s }],
            }),
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentOut>,
}

#[derive(Debug, Deserialize)]
struct ContentOut {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.0-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com/".into(),
            api_key: Some("test-key".into()),
            max_tokens: Some(256),
            temperature: Some(0.5),
            top_p: None,
            timeout_secs: Some(10),
        }
    }

    #[test]
    fn url_does_not_contain_key() {
        let svc = GeminiService::new(cfg()).unwrap();
        assert_eq!(
            svc.url_generate,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(!svc.url_generate.contains("test-key"));
    }

    #[test]
    fn request_uses_camel_case_fields() {
        let c = cfg();
        let req = GenerateContentRequest::from_cfg(&c, "Xin chào", Some("sys"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Xin chào");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hạn "},{"text":"31/3."}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_text(resp).unwrap(), "Hạn 31/3.");
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        let err = extract_text(resp).unwrap_err();
        assert!(matches!(err.kind, ProviderErrorKind::EmptyChoices));
    }
}
