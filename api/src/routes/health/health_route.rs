//! GET /health: provider probes and index status.

use std::sync::Arc;

use ai_llm_service::HealthStatus;
use axum::extract::State;
use serde::Serialize;
use tracing::debug;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct IndexHealth {
    pub loaded: bool,
    pub entries: usize,
    pub dir: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when the index is loaded and every provider probe passed.
    pub status: &'static str,
    pub index: IndexHealth,
    pub providers: Vec<HealthStatus>,
}

/// Handler: GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResponse<HealthResponse> {
    // Picks up an index built after startup.
    if let Err(e) = state.engine().await {
        debug!(error = %e, "index not available for health check");
    }
    let entries = state.index_entries().await;

    let providers = match &state.llm {
        Some(svc) => svc.health_all().await,
        None => Vec::new(),
    };
    let ok = entries.is_some() && providers.iter().all(|p| p.ok);

    ApiResponse::success(HealthResponse {
        status: if ok { "ok" } else { "degraded" },
        index: IndexHealth {
            loaded: entries.is_some(),
            entries: entries.unwrap_or(0),
            dir: state.index_dir().display().to_string(),
        },
        providers,
    })
}
