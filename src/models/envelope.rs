//! Invocation envelope types
//!
//! The host-facing request and response shapes the dispatcher works with

use axum::{
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Headers attached to every response (CORS for the static frontend)
pub const RESPONSE_HEADERS: [(&str, &str); 4] = [
    ("content-type", "application/json"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-headers", "Content-Type,Authorization"),
    ("access-control-allow-methods", "GET,POST,OPTIONS"),
];

/// One incoming invocation, already unpacked from the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// HTTP method as received
    pub method: String,
    /// Raw request path, possibly carrying the stage prefix
    pub path: String,
    /// Deployment stage name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Decoded query parameters (first value wins)
    #[serde(default)]
    pub query: HashMap<String, String>,
    /// Raw request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl InvocationRequest {
    /// Create a request with no query and no body
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the stage name
    pub fn with_stage(mut self, stage: Option<String>) -> Self {
        self.stage = stage;
        self
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Parse and attach a raw query string
    pub fn with_raw_query(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                self.query.entry(key.into_owned()).or_insert_with(|| value.into_owned());
            }
        }
        self
    }

    /// Attach a body; empty bodies are stored as `None`
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }
}

/// Response produced by the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 200 with `{"ok": true}`, used for CORS preflight
    pub fn preflight() -> Self {
        Self::new(200, json!({ "ok": true }))
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.body)).into_response();

        let headers = response.headers_mut();
        for (name, value) in RESPONSE_HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        response
    }
}
