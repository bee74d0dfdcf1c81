//! HTTP surface of the chatbot: chat page, JSON chat API, reset and health.

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

pub use crate::core::app_state::{AppState, EngineParts};
pub use crate::error_handler::AppError;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::middleware_layer::json_extractor::json_error_mapper;
use crate::routes::{
    chat_page::chat_page_route::{chat_page, index},
    health::health_route::health,
    sessions::{
        messages_route::{list_messages, post_message},
        session_route::{create_session, reset_session},
    },
};

/// Builds the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat/{session_id}", get(chat_page))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{session_id}", delete(reset_session))
        .route(
            "/api/sessions/{session_id}/messages",
            get(list_messages).post(post_message),
        )
        .route("/health", get(health))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl+C.
///
/// # Errors
/// [`AppError::Bind`] if the address cannot be bound, [`AppError::Server`] on
/// a fatal server error.
pub async fn start(state: Arc<AppState>, addr: &str) -> Result<(), AppError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(addr, "chat server listening; open http://{addr}/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::{AiLlmError, ConfigError};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use contextor::{ContextorConfig, TextGenerator};
    use rag_store::{FaqIndex, HashingEmbedder, IndexedEntry, RagConfig};
    use serde_json::{Value, json};
    use session_store::SessionStore;
    use std::{future::Future, path::Path, pin::Pin, time::Duration};
    use tower::ServiceExt;

    struct Echo;

    impl TextGenerator for Echo {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
            Box::pin(async move { Ok(format!("BOT: {}", prompt.lines().nth(1).unwrap_or(""))) })
        }
    }

    struct Down;

    impl TextGenerator for Down {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
            Box::pin(async { Err(ConfigError::MissingVar("GEMINI_API_KEY").into()) })
        }
    }

    struct Slow;

    impl TextGenerator for Slow {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok("Hạn chót là **31 tháng 3**.".to_string())
            })
        }
    }

    const DIM: usize = 128;

    fn write_index(dir: &Path) {
        let e = HashingEmbedder::new(DIM).unwrap();
        let entries = vec![IndexedEntry {
            embedding: e.embed_sync("What is the deadline?"),
            answer: "March 31.".into(),
            source_question: "What is the deadline?".into(),
        }];
        FaqIndex::new("hashing", entries)
            .unwrap()
            .save(dir)
            .unwrap();
    }

    fn state(root: &Path, generator: Arc<dyn TextGenerator>) -> Arc<AppState> {
        let parts = EngineParts {
            rag: RagConfig::new_default(root.join("faiss_index"), "hashing"),
            embedder: Arc::new(HashingEmbedder::new(DIM).unwrap()),
            generator,
            contextor: ContextorConfig::default(),
        };
        let sessions = SessionStore::new(root.join("cache")).unwrap();
        Arc::new(AppState::new(sessions, parts, None))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_question(session: &str, body: Value) -> Request<Body> {
        Request::post(format!("/api/sessions/{session}/messages"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_redirects_to_default_chat() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(dir.path(), Arc::new(Echo)));
        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        assert_eq!(res.headers()[header::LOCATION], "/chat/current_chat");
    }

    #[tokio::test]
    async fn question_round_trip_persists_both_turns() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join("faiss_index"));
        let st = state(dir.path(), Arc::new(Echo));

        let (status, body) = send(
            router(st.clone()),
            post_question("current_chat", json!({ "question": "When is the deadline?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["data"]["answer"].as_str().unwrap().contains("March 31."));
        assert_eq!(body["data"]["references"][0]["answer"], "March 31.");
        assert_eq!(body["data"]["turns"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["turns"][0]["role"], "user");

        let (_, listed) = send(
            router(st),
            Request::get("/api/sessions/current_chat/messages")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(listed["data"]["turns"][1]["role"], "assistant");
        assert!(dir.path().join("cache/current_chat.json").exists());
    }

    #[tokio::test]
    async fn empty_question_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join("faiss_index"));
        let st = state(dir.path(), Arc::new(Echo));
        let (status, body) = send(
            router(st.clone()),
            post_question("current_chat", json!({ "question": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "EMPTY_QUESTION");
        assert!(!dir.path().join("cache/current_chat.json").exists());
    }

    #[tokio::test]
    async fn malformed_body_gets_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(dir.path(), Arc::new(Echo)));
        let (status, body) = send(app, post_question("current_chat", json!({ "q": 1 }))).await;
        assert!(status.is_client_error());
        assert_eq!(body["success"], false);
        assert!(body["error"]["code"].is_string());
    }

    #[tokio::test]
    async fn missing_index_keeps_user_turn_only() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path(), Arc::new(Echo));
        let (status, body) = send(
            router(st.clone()),
            post_question("s1", json!({ "question": "When is the deadline?" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "INDEX_NOT_FOUND");

        let turns = st.sessions.load(&"s1".parse().unwrap()).await.turns().to_vec();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "When is the deadline?");

        // An index written later is picked up without a restart.
        write_index(&dir.path().join("faiss_index"));
        let (status, _) = send(
            router(st),
            post_question("s1", json!({ "question": "When is the deadline?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn generation_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join("faiss_index"));
        let st = state(dir.path(), Arc::new(Down));
        let (status, body) = send(
            router(st),
            post_question("current_chat", json!({ "question": "deadline?" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "GENERATION_SERVICE_ERROR");
    }

    #[tokio::test]
    async fn reset_clears_history() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join("faiss_index"));
        let st = state(dir.path(), Arc::new(Echo));
        send(
            router(st.clone()),
            post_question("current_chat", json!({ "question": "deadline?" })),
        )
        .await;

        let (status, body) = send(
            router(st.clone()),
            Request::delete("/api/sessions/current_chat")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cleared"], true);
        assert!(!dir.path().join("cache/current_chat.json").exists());
        assert!(st.sessions.load(&"current_chat".parse().unwrap()).await.turns().is_empty());
    }

    #[tokio::test]
    async fn creates_sessions_and_rejects_bad_ids() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path(), Arc::new(Echo));
        let (status, body) = send(
            router(st.clone()),
            Request::post("/api/sessions").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["session_id"].as_str().unwrap();
        assert_eq!(body["data"]["url"], format!("/chat/{id}"));

        let (status, body) = send(
            router(st),
            Request::get("/api/sessions/bad.id/messages")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_SESSION_ID");
    }

    #[tokio::test]
    async fn health_reports_index() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join("faiss_index"));
        let (status, body) = send(
            router(state(dir.path(), Arc::new(Echo))),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["index"]["loaded"], true);
        assert_eq!(body["data"]["index"]["entries"], 1);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn health_is_degraded_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            router(state(dir.path(), Arc::new(Echo))),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "degraded");
        assert_eq!(body["data"]["index"]["loaded"], false);
        assert_eq!(body["data"]["index"]["entries"], 0);
    }

    #[tokio::test]
    async fn history_stays_readable_while_answering() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join("faiss_index"));
        let st = state(dir.path(), Arc::new(Slow));

        let in_flight = tokio::spawn(send(
            router(st.clone()),
            post_question("current_chat", json!({ "question": "When is the deadline?" })),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let page = tokio::time::timeout(
            Duration::from_millis(200),
            router(st.clone())
                .oneshot(Request::get("/chat/current_chat").body(Body::empty()).unwrap()),
        )
        .await
        .expect("chat page waited for the answer")
        .unwrap();
        assert_eq!(page.status(), StatusCode::OK);

        let (status, listed) = tokio::time::timeout(
            Duration::from_millis(200),
            send(
                router(st.clone()),
                Request::get("/api/sessions/current_chat/messages")
                    .body(Body::empty())
                    .unwrap(),
            ),
        )
        .await
        .expect("message list waited for the answer");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["data"]["turns"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"]["turns"][0]["role"], "user");

        let (status, body) = in_flight.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["turns"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["persisted"], true);
        assert!(
            body["data"]["answer_html"]
                .as_str()
                .unwrap()
                .contains("<strong>31 tháng 3</strong>")
        );
    }

    #[tokio::test]
    async fn answer_is_returned_when_history_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&dir.path().join("faiss_index"));
        let st = state(dir.path(), Arc::new(Echo));
        // A directory where the temp file should go makes every write fail.
        std::fs::create_dir(dir.path().join("cache/current_chat.json.tmp")).unwrap();

        let (status, body) = send(
            router(st),
            post_question("current_chat", json!({ "question": "When is the deadline?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["persisted"], false);
        assert!(body["data"]["answer"].as_str().unwrap().contains("March 31."));
        let turns = body["data"]["turns"].as_array().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0]["content"], "When is the deadline?");
        assert!(!dir.path().join("cache/current_chat.json").exists());
    }
}
