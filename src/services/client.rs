//! Upstream HTTP client
//!
//! Issues authenticated JSON requests against the Mesh API and normalises
//! every outcome, including transport failures, into a status/body pair

use crate::config::MeshConfig;
use crate::utils::logging::create_body_log_summary;
use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::error::Error as _;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Synthetic status reported when no response was received
pub const TRANSPORT_FAILURE_STATUS: u16 = 599;

/// Header carrying the client secret
pub const CLIENT_SECRET_HEADER: &str = "X-Client-Secret";

/// Header carrying the client id
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Normalised upstream outcome
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// HTTP status, or [`TRANSPORT_FAILURE_STATUS`]
    pub status: u16,
    /// Parsed body
    pub body: Value,
}

impl UpstreamResponse {
    /// Whether the status is in the error class
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Whether no response was received at all
    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE_STATUS
    }

    /// Description carried by a transport failure
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    fn transport_failure(message: String) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            body: json!({ "error": message, "status": TRANSPORT_FAILURE_STATUS }),
        }
    }
}

/// Optional parts of an upstream call
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions<'a> {
    /// JSON body
    pub payload: Option<&'a Value>,
    /// Query parameters; arrays repeat the key
    pub query: Option<&'a Map<String, Value>>,
    /// Headers applied after the defaults
    pub extra_headers: Option<&'a HashMap<String, String>>,
}

/// Mesh API client
///
/// One instance lives for the whole process; it holds no per-request state.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    /// Create a new client with the given timeout
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("meshproxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Send a request and normalise the outcome
    ///
    /// Never fails: HTTP errors come back with their status and a best-effort
    /// body, transport errors as [`TRANSPORT_FAILURE_STATUS`].
    pub async fn call(
        &self,
        method: Method,
        url: &str,
        config: &MeshConfig,
        options: CallOptions<'_>,
    ) -> UpstreamResponse {
        debug!("Sending upstream request: {} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json")
            .header(CLIENT_SECRET_HEADER, &config.client_secret);

        if let Some(client_id) = &config.client_id {
            request = request.header(CLIENT_ID_HEADER, client_id);
        }

        if let Some(query) = options.query {
            request = request.query(&query_pairs(query));
        }

        if let Some(payload) = options.payload {
            debug!("Upstream payload: {}", create_body_log_summary(payload));
            request = request.header(CONTENT_TYPE, "application/json").json(payload);
        }

        if let Some(headers) = options.extra_headers {
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = describe_transport_error(&e);
                error!("Upstream request {} {} failed: {}", method, url, message);
                return UpstreamResponse::transport_failure(message);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let message = describe_transport_error(&e);
                error!("Failed to read upstream response body: {}", message);
                return UpstreamResponse::transport_failure(message);
            }
        };

        let body = if status.is_success() {
            parse_success_body(&text)
        } else {
            warn!("Upstream returned {} for {} {}", status, method, url);
            parse_error_body(status.as_u16(), &text)
        };

        debug!("Upstream response {}: {}", status, create_body_log_summary(&body));

        UpstreamResponse {
            status: status.as_u16(),
            body,
        }
    }
}

/// Flatten a JSON query map into key/value pairs
///
/// Arrays repeat the key per element; `null` values are skipped.
pub fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse a successful body: empty -> `{}`, non-JSON -> `{"raw": text}`
pub fn parse_success_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// Parse an error body, guaranteeing an object with a `status` field
pub fn parse_error_body(status: u16, text: &str) -> Value {
    let mut body = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => json!({ "error": other }),
        Err(_) => json!({ "error": text }),
    };

    if let Some(map) = body.as_object_mut() {
        map.entry("status").or_insert_with(|| json!(status));
    }
    body
}

/// Describe a reqwest failure without echoing the request URL
fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return "Upstream request timed out".to_string();
    }

    let mut message = if e.is_connect() {
        "Failed to connect to upstream".to_string()
    } else {
        "Upstream request failed".to_string()
    };

    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
