//! Response envelope middleware
//!
//! Rejections produced below the dispatcher (body size limit, body buffering)
//! come back as plain text without CORS headers; rewrite them into the JSON
//! envelope every caller expects.

use crate::models::ApiResponse;
use crate::utils::error::AppError;
use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

/// Rewrite non-JSON error responses into the JSON envelope
pub async fn json_envelope_middleware(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    warn!("Rewriting non-JSON {} rejection", status);

    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge.into_response();
    }

    let reason = status.canonical_reason().unwrap_or("Request failed");
    ApiResponse::new(status.as_u16(), json!({ "error": reason })).into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_plain_text_413_rewritten() {
        let response = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let rewritten = json_envelope_middleware(response).await;

        assert_eq!(rewritten.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(rewritten.headers()["content-type"], "application/json");
        assert_eq!(rewritten.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_json_responses_untouched() {
        let response = ApiResponse::new(413, json!({"error": "Upstream request failed"})).into_response();
        let passed = json_envelope_middleware(response).await;

        let bytes = axum::body::to_bytes(passed.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Upstream request failed");
    }

    #[tokio::test]
    async fn test_success_untouched() {
        let response = Response::new(Body::from("ok"));
        let passed = json_envelope_middleware(response).await;
        assert!(passed.headers().get(CONTENT_TYPE).is_none());
    }
}
