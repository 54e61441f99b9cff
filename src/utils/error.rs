//! Error handling module
//!
//! Defines the error taxonomy shared by the secret loader, config resolver,
//! upstream client and dispatcher

use crate::models::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Secret is readable but lacks a required field
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        /// Secret key name -> whether its value was truthy
        secret_keys: BTreeMap<String, bool>,
    },

    /// Secret store unreachable, secret missing or malformed
    #[error("Secret backend error: {0}")]
    SecretBackend(String),

    /// Required caller input missing or unreadable
    #[error("{message}")]
    Validation {
        message: String,
        /// Expected field name -> whether the caller supplied it
        received: BTreeMap<String, bool>,
    },

    /// Upstream answered with an error status
    #[error("Upstream request failed with status {status}")]
    Upstream {
        status: u16,
        body: Value,
        /// Redacted outgoing payload, payment routes only
        payload: Option<Value>,
    },

    /// No response received from upstream
    #[error("Upstream unreachable: {message}")]
    Transport {
        status: u16,
        message: String,
        body: Value,
        payload: Option<Value>,
    },

    /// No route matched
    #[error("Route {method} {path} not found")]
    NotFound { method: String, path: String },

    /// Caller body exceeded the configured size limit
    #[error("Request body too large")]
    PayloadTooLarge,
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream { status, .. } | AppError::Transport { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Config { .. } | AppError::SecretBackend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Config { .. } => "config_error",
            AppError::SecretBackend(_) => "secret_backend_error",
            AppError::Validation { .. } => "validation_error",
            AppError::Upstream { .. } => "upstream_error",
            AppError::Transport { .. } => "transport_error",
            AppError::NotFound { .. } => "not_found_error",
            AppError::PayloadTooLarge => "payload_too_large_error",
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(
            self,
            AppError::Validation { .. } | AppError::NotFound { .. } | AppError::PayloadTooLarge
        )
    }

    /// Build the JSON body returned to the caller
    ///
    /// Secret values and caller tokens never appear here; payloads carried by
    /// upstream errors are redacted before they reach this type.
    pub fn to_body(&self) -> Value {
        match self {
            AppError::Config { message, secret_keys } => json!({
                "error": "Configuration error",
                "detail": message,
                "secretKeys": secret_keys,
                "secretConfigured": !secret_keys.is_empty(),
            }),
            AppError::Validation { message, received } => json!({
                "error": message,
                "received": received,
            }),
            AppError::Upstream { status, body, payload } => {
                let mut envelope = json!({
                    "error": "Upstream request failed",
                    "status": status,
                    "upstream": body,
                });
                if let Some(payload) = payload {
                    envelope["payload"] = payload.clone();
                }
                envelope
            }
            AppError::Transport { status, message, body, payload } => {
                let mut envelope = json!({
                    "error": format!("Upstream unreachable: {}", message),
                    "status": status,
                    "upstream": body,
                });
                if let Some(payload) = payload {
                    envelope["payload"] = payload.clone();
                }
                envelope
            }
            AppError::NotFound { .. } | AppError::PayloadTooLarge => json!({ "error": self.to_string() }),
            AppError::SecretBackend(_) => json!({ "error": "Internal server error" }),
        }
    }

    /// Convert to the response envelope
    pub fn to_api_response(&self) -> ApiResponse {
        ApiResponse::new(self.status_code().as_u16(), self.to_body())
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.should_log_details() {
            tracing::error!(error_type = self.error_type(), "Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!(error_type = self.error_type(), "Client error: {} - Status code: {}", self, status);
        }

        self.to_api_response().into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error handling helper functions
pub mod helpers {
    use super::*;

    /// Create a validation error for a single missing field
    ///
    /// `expected` lists every field name that could have satisfied the
    /// requirement, paired with whether the caller supplied it.
    pub fn missing_field_error(field: &str, expected: &[(&str, bool)]) -> AppError {
        AppError::Validation {
            message: format!("{} is required", field),
            received: expected
                .iter()
                .map(|(name, present)| (name.to_string(), *present))
                .collect(),
        }
    }

    /// Create a secret backend error
    pub fn secret_backend_error(message: impl Into<String>) -> AppError {
        AppError::SecretBackend(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(helpers::missing_field_error("authToken", &[]).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotFound { method: "GET".into(), path: "/x".into() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::SecretBackend("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::Upstream { status: 422, body: json!({}), payload: None }.status_code().as_u16(),
            422
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::NotFound { method: "GET".into(), path: "/unknown".into() };
        assert_eq!(err.to_body(), json!({"error": "Route GET /unknown not found"}));
    }

    #[test]
    fn test_backend_error_hides_detail() {
        let err = AppError::SecretBackend("ResourceNotFoundException: prod/mesh".into());
        let body = err.to_body();
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[test]
    fn test_upstream_envelope_without_payload() {
        let err = AppError::Upstream { status: 401, body: json!({"status": 401}), payload: None };
        let body = err.to_body();
        assert_eq!(body["status"], 401);
        assert!(body.get("payload").is_none());
    }
}
