pub mod gemini_service;
pub mod ollama_service;
pub mod open_ai_service;

use std::time::Duration;

use crate::error_handler::{HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet, parse_retry_after};

/// Default per-request timeout when a config omits `timeout_secs`.
pub(crate) fn request_timeout(secs: Option<u64>) -> Duration {
    Duration::from_secs(secs.unwrap_or(60))
}

/// Turns a non-2xx response into a [`ProviderError`] carrying status, snippet and `Retry-After`.
pub(crate) async fn status_error(
    provider: Provider,
    url: &str,
    resp: reqwest::Response,
) -> ProviderError {
    let status = resp.status();
    let retry_after = parse_retry_after(resp.headers());
    let text = resp.text().await.unwrap_or_default();
    ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet: make_snippet(&text),
            retry_after,
        }),
    )
}
