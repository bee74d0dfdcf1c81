use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id taken from the incoming header or generated.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn request_id_of(req: &Request<Body>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let nanos = Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
            format!("req-{nanos}")
        })
}

fn hint_for(original: &str) -> Option<String> {
    if original.contains("missing field `question`") {
        Some("Body must be a JSON object like { \"question\": \"...\" }.".into())
    } else if original.contains("Content-Type") {
        Some("Set `Content-Type: application/json`.".into())
    } else if original.contains("expected a string") {
        Some("`question` must be a string.".into())
    } else {
        None
    }
}

/// Tags every request with an id and rewrites plain-text 400/422 rejections
/// (e.g. from the `Json` extractor) into the JSON envelope.
pub async fn json_error_mapper(mut req: Request<Body>, next: Next) -> Response {
    let req_id = request_id_of(&req);
    req.extensions_mut().insert(RequestId(req_id.clone()));

    let mut res = next.run(req).await;
    if let Ok(v) = HeaderValue::from_str(&req_id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, v);
    }

    let status = res.status();
    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        return res;
    }
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        // Already an envelope produced by a handler.
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    let original = String::from_utf8_lossy(&bytes);
    debug!(request_id = %req_id, status = %status, body = %original, "rewriting rejection");

    let detail = ApiErrorDetail {
        path: original.contains("question").then(|| "question".to_string()),
        hint: hint_for(&original),
    };
    let envelope = ApiResponse::<()>::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        original.trim(),
        vec![detail],
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}
