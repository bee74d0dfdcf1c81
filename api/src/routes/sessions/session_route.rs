//! POST /api/sessions and DELETE /api/sessions/{session_id}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use session_store::SessionId;
use tracing::info;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::sessions::session_dto::{SessionClearedResponse, SessionCreatedResponse},
};

/// Handler: POST /api/sessions: allocates a fresh, empty session.
pub async fn create_session() -> Response {
    let id = SessionId::generate();
    info!(session = %id, "session created");
    ApiResponse::success(SessionCreatedResponse {
        url: format!("/chat/{id}"),
        session_id: id,
    })
    .into_response_with_status(StatusCode::CREATED)
}

/// Handler: DELETE /api/sessions/{session_id}: starts a new conversation.
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id: SessionId = session_id.parse()?;
    let mut session = state.sessions.load(&id).await;
    session.clear()?;
    Ok(ApiResponse::success(SessionClearedResponse {
        session_id: id,
        cleared: true,
    }))
}
