use contextor::UsedReference;
use serde::{Deserialize, Serialize};
use session_store::{ChatTurn, SessionId};

/// Body of `POST /api/sessions/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub question: String,
}

/// Answer plus the full conversation after both turns were appended.
#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub session_id: SessionId,
    pub answer: String,
    /// `answer` rendered from markdown, raw HTML escaped.
    pub answer_html: String,
    pub references: Vec<UsedReference>,
    pub turns: Vec<ChatTurn>,
    /// `false` when the history cache could not be written.
    pub persisted: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionTurnsResponse {
    pub session_id: SessionId,
    pub turns: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: SessionId,
    /// Chat page of the new session.
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionClearedResponse {
    pub session_id: SessionId,
    pub cleared: bool,
}
