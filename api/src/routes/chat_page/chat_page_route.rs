//! GET / and GET /chat/{session_id}: the browser chat page.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
};
use minijinja::{Environment, context};
use serde::Serialize;
use session_store::{ChatTurn, SessionId};

use crate::{
    core::{app_state::AppState, markdown::render_markdown},
    error_handler::AppResult,
};

const CHAT_TEMPLATE: &str = include_str!("../../../templates/chat.html");

/// Handler: GET /: opens the default conversation.
pub async fn index() -> Redirect {
    Redirect::to(&format!("/chat/{}", SessionId::DEFAULT))
}

#[derive(Serialize)]
struct TurnView<'a> {
    role: &'a str,
    html: String,
}

/// Handler: GET /chat/{session_id}
///
/// Shows the cached history; an answer still being generated does not block it.
pub async fn chat_page(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> AppResult<Html<String>> {
    let id: SessionId = session_id.parse()?;
    let turns = state.sessions.snapshot(&id);
    let page = render_chat(&id, &turns)?;
    Ok(Html(page))
}

/// Renders the page. Turn contents go through markdown with raw HTML escaped.
pub fn render_chat(id: &SessionId, turns: &[ChatTurn]) -> Result<String, minijinja::Error> {
    let views: Vec<TurnView<'_>> = turns
        .iter()
        .map(|t| TurnView {
            role: t.role.as_str(),
            html: render_markdown(&t.content),
        })
        .collect();

    let mut env = Environment::new();
    env.add_template("chat.html", CHAT_TEMPLATE)?;
    env.get_template("chat.html")?.render(context! {
        session_id => id.as_str(),
        turns => views,
    })
}
