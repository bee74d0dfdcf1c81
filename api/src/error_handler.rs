use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use rag_store::RagError;
use session_store::SessionError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error(transparent)]
    InvalidSession(SessionError),

    // --- Pipeline ---
    #[error("the FAQ index is not available: {0}")]
    IndexUnavailable(String),

    #[error("embedding service unavailable: {0}")]
    Embedding(String),

    #[error("generation service unavailable: {0}")]
    Generation(String),

    #[error("session storage failed: {0}")]
    Session(SessionError),

    #[error("page rendering failed: {0}")]
    Template(#[from] minijinja::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest(_) | AppError::EmptyQuestion | AppError::InvalidSession(_) => {
                StatusCode::BAD_REQUEST
            }

            // upstream
            AppError::IndexUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Embedding(_) | AppError::Generation(_) => StatusCode::BAD_GATEWAY,

            // 5xx
            AppError::Bind { .. }
            | AppError::Server(_)
            | AppError::Session(_)
            | AppError::Template(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::EmptyQuestion => "EMPTY_QUESTION",
            AppError::InvalidSession(_) => "INVALID_SESSION_ID",
            AppError::IndexUnavailable(_) => "INDEX_NOT_FOUND",
            AppError::Embedding(_) => "EMBEDDING_SERVICE_ERROR",
            AppError::Generation(_) => "GENERATION_SERVICE_ERROR",
            AppError::Session(_) => "SESSION_IO_ERROR",
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        match self {
            AppError::EmptyQuestion => vec![ApiErrorDetail {
                path: Some("question".into()),
                hint: Some("Send a non-blank `question` string.".into()),
            }],
            AppError::IndexUnavailable(_) => vec![ApiErrorDetail {
                path: None,
                hint: Some("Build the index with `hus-chatbot index`.".into()),
            }],
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), self.details())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidId(_) => AppError::InvalidSession(err),
            other => AppError::Session(other),
        }
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::EmptyQuery => AppError::EmptyQuestion,
            RagError::Embedding(msg) => AppError::Embedding(msg),
            e @ (RagError::IndexNotFound(_)
            | RagError::Parse(_)
            | RagError::VectorSizeMismatch { .. }
            | RagError::Config(_)) => AppError::IndexUnavailable(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        match err {
            ContextorError::Rag(e) => e.into(),
            ContextorError::Generation(e) => AppError::Generation(e.to_string()),
            ContextorError::Template(e) => AppError::Template(e),
        }
    }
}
