//! GET/POST /api/sessions/{session_id}/messages

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use session_store::{ChatTurn, SessionId};
use tracing::{debug, error, info, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse, markdown::render_markdown},
    error_handler::{AppError, AppResult},
    middleware_layer::json_extractor::RequestId,
    routes::sessions::session_dto::{
        PostMessageRequest, PostMessageResponse, SessionTurnsResponse,
    },
};

/// Handler: GET /api/sessions/{session_id}/messages
///
/// Reads the cache without waiting for an in-flight answer.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> AppResult<ApiResponse<SessionTurnsResponse>> {
    let id: SessionId = session_id.parse()?;
    let turns = state.sessions.snapshot(&id);
    Ok(ApiResponse::success(SessionTurnsResponse {
        session_id: id,
        turns,
    }))
}

/// Handler: POST /api/sessions/{session_id}/messages
///
/// The user turn is persisted before the pipeline runs and the session lock
/// is released while retrieval and generation are in flight. A pipeline
/// failure leaves the user turn in place and returns an error envelope;
/// nothing is stored for the assistant side. A failed cache write is logged
/// and reported as `persisted: false`, the answer is still returned.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8501/api/sessions/current_chat/messages \
///   -H 'content-type: application/json' \
///   -d '{"question":"Hạn nộp hồ sơ là khi nào?"}'
/// ```
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(req_id)): Extension<RequestId>,
    Path(session_id): Path<String>,
    Json(body): Json<PostMessageRequest>,
) -> AppResult<ApiResponse<PostMessageResponse>> {
    let id: SessionId = session_id.parse()?;
    let question = body.question.trim();
    if question.is_empty() {
        return Err(AppError::EmptyQuestion);
    }
    debug!(request_id = %req_id, session = %id, question_len = question.len(), "question received");

    let user_persisted = {
        let mut session = state.sessions.load(&id).await;
        session.append(ChatTurn::user(question)).is_ok()
    };

    let qa = async {
        let engine = state.engine().await?;
        engine
            .ask(question, state.ask_opts)
            .await
            .map_err(AppError::from)
    }
    .await
    .inspect_err(|e| error!(request_id = %req_id, session = %id, error = %e, "answering failed"))?;

    let mut session = state.sessions.load(&id).await;
    let mut persisted = true;
    if !user_persisted {
        // The cache never saw the question; write it ahead of the answer.
        persisted &= session.append(ChatTurn::user(question)).is_ok();
    }
    persisted &= session.append(ChatTurn::assistant(qa.answer.clone())).is_ok();
    if !persisted {
        warn!(request_id = %req_id, session = %id, "answer delivered without being cached");
    }
    info!(
        request_id = %req_id,
        session = %id,
        turns = session.turns().len(),
        persisted,
        "answer delivered"
    );

    Ok(ApiResponse::success(PostMessageResponse {
        session_id: id,
        answer_html: render_markdown(&qa.answer),
        answer: qa.answer,
        references: qa.references,
        turns: session.turns().to_vec(),
        persisted,
    }))
}
