//! Error handling module unit tests

use axum::http::StatusCode;
use axum::response::IntoResponse;
use meshproxy::utils::error::helpers::*;
use meshproxy::utils::error::*;
use meshproxy::utils::logging::{redact_sensitive, REDACTED};
use serde_json::json;
use std::collections::BTreeMap;

#[test]
fn test_app_error_status_codes() {
    let test_cases = vec![
        (
            AppError::Config { message: "x".to_string(), secret_keys: BTreeMap::new() },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (secret_backend_error("x"), StatusCode::INTERNAL_SERVER_ERROR),
        (missing_field_error("authToken", &[]), StatusCode::BAD_REQUEST),
        (
            AppError::Upstream { status: 404, body: json!({}), payload: None },
            StatusCode::NOT_FOUND,
        ),
        (
            AppError::Transport { status: 599, message: "x".to_string(), body: json!({}), payload: None },
            StatusCode::from_u16(599).unwrap(),
        ),
        (
            AppError::NotFound { method: "GET".to_string(), path: "/x".to_string() },
            StatusCode::NOT_FOUND,
        ),
        (AppError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
    ];

    for (error, expected_status) in test_cases {
        assert_eq!(error.status_code(), expected_status, "{:?}", error);
    }
}

#[test]
fn test_error_types() {
    assert_eq!(secret_backend_error("x").error_type(), "secret_backend_error");
    assert_eq!(missing_field_error("authToken", &[]).error_type(), "validation_error");
    assert_eq!(AppError::PayloadTooLarge.error_type(), "payload_too_large_error");
    assert_eq!(
        AppError::NotFound { method: "GET".into(), path: "/".into() }.error_type(),
        "not_found_error"
    );
}

#[test]
fn test_log_detail_policy() {
    assert!(!missing_field_error("authToken", &[]).should_log_details());
    assert!(!AppError::NotFound { method: "GET".into(), path: "/".into() }.should_log_details());
    assert!(!AppError::PayloadTooLarge.should_log_details());
    assert!(secret_backend_error("x").should_log_details());
    assert!(AppError::Upstream { status: 500, body: json!({}), payload: None }.should_log_details());
}

#[test]
fn test_every_body_has_error_string() {
    let errors = vec![
        AppError::Config { message: "Missing required secret field: MESH_BASE_URL".into(), secret_keys: BTreeMap::new() },
        secret_backend_error("x"),
        missing_field_error("authToken", &[("authToken", false)]),
        AppError::Upstream { status: 400, body: json!({"status": 400}), payload: None },
        AppError::Transport { status: 599, message: "timed out".into(), body: json!({}), payload: None },
        AppError::NotFound { method: "POST".into(), path: "/nope".into() },
        AppError::PayloadTooLarge,
    ];

    for error in errors {
        let body = error.to_body();
        assert!(body["error"].is_string(), "{:?}", error);
    }
}

#[test]
fn test_config_error_body() {
    let secret_keys = BTreeMap::from([("MESH_API_KEY".to_string(), true)]);
    let error = AppError::Config {
        message: "Missing required secret field: MESH_BASE_URL".into(),
        secret_keys,
    };

    assert_eq!(
        error.to_body(),
        json!({
            "error": "Configuration error",
            "detail": "Missing required secret field: MESH_BASE_URL",
            "secretKeys": {"MESH_API_KEY": true},
            "secretConfigured": true,
        })
    );
}

#[test]
fn test_validation_error_body() {
    let error = missing_field_error("authToken", &[("authToken", false), ("accessToken", true)]);
    assert_eq!(
        error.to_body(),
        json!({"error": "authToken is required", "received": {"authToken": false, "accessToken": true}})
    );
}

#[test]
fn test_upstream_error_envelope_with_payload() {
    let payload = redact_sensitive(&json!({"accessToken": "tok123", "memo": "Shoes"}));
    let error = AppError::Upstream {
        status: 422,
        body: json!({"message": "bad", "status": 422}),
        payload: Some(payload),
    };

    let body = error.to_body();
    assert_eq!(body["error"], "Upstream request failed");
    assert_eq!(body["status"], 422);
    assert_eq!(body["upstream"]["message"], "bad");
    assert_eq!(body["payload"]["accessToken"], REDACTED);
    assert_eq!(body["payload"]["memo"], "Shoes");
}

#[test]
fn test_transport_error_message() {
    let error = AppError::Transport {
        status: 599,
        message: "Upstream request timed out".into(),
        body: json!({"error": "Upstream request timed out", "status": 599}),
        payload: None,
    };

    assert_eq!(error.to_string(), "Upstream unreachable: Upstream request timed out");
    assert_eq!(error.to_body()["error"], "Upstream unreachable: Upstream request timed out");
}

#[test]
fn test_payload_too_large_body() {
    assert_eq!(AppError::PayloadTooLarge.to_body(), json!({"error": "Request body too large"}));
}

#[test]
fn test_into_response_carries_cors_headers() {
    let response = missing_field_error("authToken", &[]).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["content-type"], "application/json");
}

#[test]
fn test_redaction_keeps_structure() {
    let value = json!({
        "authToken": "a",
        "nested": [{"clientSecret": "s", "keep": 1}],
        "mfaCode": null,
    });

    assert_eq!(
        redact_sensitive(&value),
        json!({
            "authToken": REDACTED,
            "nested": [{"clientSecret": REDACTED, "keep": 1}],
            "mfaCode": null,
        })
    );
}
