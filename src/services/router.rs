//! Request dispatcher
//!
//! Maps a normalised (method, path) onto a payload builder, an upstream
//! endpoint and a response-shaping policy, then renders the outcome

use crate::config::MeshConfig;
use crate::models::{ApiResponse, InvocationRequest};
use crate::secrets::SecretLoader;
use crate::services::client::{CallOptions, UpstreamClient, UpstreamResponse};
use crate::services::payload::{self, Payload};
use crate::utils::error::{helpers::missing_field_error, AppError, AppResult};
use crate::utils::logging::{redact_sensitive, scrub_text, scrub_values, sensitive_values};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Body of the health check
pub const HEALTH_MESSAGE: &str = "Hello from Lambda + HTTP API";

/// What a matched route does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// `GET /`, answered without configuration
    Health,
    /// Proxied to the Mesh API
    Mesh(MeshRoute),
}

/// Routes that load the configuration and call upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRoute {
    /// Link token for account connection
    LinkToken,
    /// Payment: legacy direct transfer or pay link token
    Pay,
    /// Holdings snapshot
    Portfolio,
}

/// Fixed route table: (method, normalised path, route)
pub const ROUTES: &[(&str, &str, RouteKind)] = &[
    ("GET", "/", RouteKind::Health),
    ("POST", "/mesh/link-token", RouteKind::Mesh(MeshRoute::LinkToken)),
    ("POST", "/mesh/link-token/connect", RouteKind::Mesh(MeshRoute::LinkToken)),
    ("POST", "/mesh/link-token/pay", RouteKind::Mesh(MeshRoute::Pay)),
    ("GET", "/mesh/portfolio", RouteKind::Mesh(MeshRoute::Portfolio)),
    ("POST", "/mesh/portfolio", RouteKind::Mesh(MeshRoute::Portfolio)),
];

/// How a successful upstream body is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Body returned as received
    Passthrough,
    /// `content.linkToken` hoisted to a top-level `linkToken`
    LinkToken,
}

impl ResponseShape {
    pub fn apply(self, mut body: Value) -> Value {
        if self == ResponseShape::LinkToken {
            let hoisted = body
                .pointer("/content/linkToken")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let (Some(map), Some(token)) = (body.as_object_mut(), hoisted) {
                map.entry("linkToken").or_insert(Value::String(token));
            }
        }
        body
    }
}

/// One upstream call prepared by a route
struct UpstreamPlan<'a> {
    url: &'a str,
    payload: Payload,
    shape: ResponseShape,
    /// Echo the (redacted) payload in error envelopes
    include_payload: bool,
}

/// Strip the stage prefix and any trailing slash (root stays `/`)
pub fn normalize_path(path: &str, stage: Option<&str>) -> String {
    let mut path = if path.is_empty() { "/" } else { path };

    if let Some(stage) = stage.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
        let prefix = format!("/{}", stage);
        if let Some(rest) = path.strip_prefix(prefix.as_str()) {
            if rest.is_empty() || rest.starts_with('/') {
                path = if rest.is_empty() { "/" } else { rest };
            }
        }
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Look up the route for a normalised method and path
pub fn match_route(method: &str, path: &str) -> Option<RouteKind> {
    ROUTES
        .iter()
        .find(|(route_method, route_path, _)| *route_method == method && *route_path == path)
        .map(|(_, _, kind)| *kind)
}

/// Parse the caller body: empty -> `{}`, non-object JSON -> `{}`
pub fn parse_body(body: Option<&str>) -> AppResult<Payload> {
    let Some(text) = body.filter(|text| !text.trim().is_empty()) else {
        return Ok(Payload::new());
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Payload::new()),
        Err(_) => Err(AppError::Validation {
            message: "Request body must be valid JSON".to_string(),
            received: BTreeMap::from([("body".to_string(), true)]),
        }),
    }
}

/// Stateless dispatcher shared by every invocation
#[derive(Clone)]
pub struct Dispatcher {
    loader: SecretLoader,
    client: UpstreamClient,
}

impl Dispatcher {
    pub fn new(loader: SecretLoader, client: UpstreamClient) -> Self {
        Self { loader, client }
    }

    /// Handle one invocation
    ///
    /// Every outcome becomes an [`ApiResponse`] except secret backend
    /// failures, which propagate to the host.
    pub async fn dispatch(&self, request: InvocationRequest) -> AppResult<ApiResponse> {
        let method = request.method.to_uppercase();
        let path = normalize_path(&request.path, request.stage.as_deref());

        if method == "OPTIONS" {
            return Ok(ApiResponse::preflight());
        }

        let Some(route) = match_route(&method, &path) else {
            debug!("No route for {} {}", method, path);
            return Ok(AppError::NotFound { method, path }.to_api_response());
        };

        info!(route = ?route, "Dispatching {} {}", method, path);

        let result = match route {
            RouteKind::Health => Ok(health_response()),
            RouteKind::Mesh(route) => self.handle_mesh_route(route, &method, &request).await,
        };

        match result {
            Ok(response) => Ok(response),
            Err(err @ AppError::SecretBackend(_)) => Err(err),
            Err(err) => {
                if err.should_log_details() {
                    warn!(error_type = err.error_type(), "{} {} failed: {}", method, path, err);
                } else {
                    debug!(error_type = err.error_type(), "{} {} rejected: {}", method, path, err);
                }
                Ok(err.to_api_response())
            }
        }
    }

    async fn handle_mesh_route(&self, route: MeshRoute, method: &str, request: &InvocationRequest) -> AppResult<ApiResponse> {
        let config = self.load_config().await?;
        let body = parse_body(request.body.as_deref())?;

        let plan = match route {
            MeshRoute::LinkToken => UpstreamPlan {
                url: &config.link_token_url,
                payload: payload::build_link_token_payload(&body, &config),
                shape: ResponseShape::LinkToken,
                include_payload: false,
            },
            MeshRoute::Pay if payload::legacy_transfer_token(&body).is_some() => {
                debug!("Access token supplied, using direct transfer");
                UpstreamPlan {
                    url: &config.transfer_url,
                    payload: payload::build_transfer_payload(&body, &config),
                    shape: ResponseShape::Passthrough,
                    include_payload: true,
                }
            }
            MeshRoute::Pay => UpstreamPlan {
                url: &config.link_token_url,
                payload: payload::build_pay_link_token_payload(&body, &config),
                shape: ResponseShape::LinkToken,
                include_payload: true,
            },
            MeshRoute::Portfolio => {
                let prefer_body = method == "POST";
                let token = payload::find_auth_token(&body, &request.query, prefer_body).ok_or_else(|| {
                    let supplied = |field: &str| {
                        request.query.contains_key(field) || payload::first_string(&body, &[field]).is_some()
                    };
                    missing_field_error(
                        "authToken",
                        &[("authToken", supplied("authToken")), ("accessToken", supplied("accessToken"))],
                    )
                })?;
                UpstreamPlan {
                    url: &config.portfolio_url,
                    payload: payload::build_portfolio_payload(&body, token, &request.query),
                    shape: ResponseShape::Passthrough,
                    include_payload: false,
                }
            }
        };

        self.forward(&config, plan).await
    }

    /// Load the secret and resolve it; both steps run on every invocation
    async fn load_config(&self) -> AppResult<MeshConfig> {
        let secret = self.loader.load().await?;
        MeshConfig::resolve(&secret)
    }

    async fn forward(&self, config: &MeshConfig, plan: UpstreamPlan<'_>) -> AppResult<ApiResponse> {
        let payload = Value::Object(plan.payload);
        let options = CallOptions {
            payload: Some(&payload),
            ..Default::default()
        };

        let upstream = self.client.call(Method::POST, plan.url, config, options).await;

        if upstream.is_error() {
            let echoed = plan.include_payload.then(|| redact_sensitive(&payload));
            return Err(upstream_error(upstream, echoed, &sensitive_values(&payload)));
        }

        Ok(ApiResponse::new(upstream.status, plan.shape.apply(upstream.body)))
    }
}

fn health_response() -> ApiResponse {
    ApiResponse::new(200, json!({ "ok": true, "message": HEALTH_MESSAGE }))
}

/// Wrap an error-class upstream outcome
///
/// `secrets` are the caller tokens sent upstream; they are masked wherever
/// the upstream body quotes them.
fn upstream_error(upstream: UpstreamResponse, payload: Option<Value>, secrets: &[String]) -> AppError {
    let body = scrub_values(&redact_sensitive(&upstream.body), secrets);
    if upstream.is_transport_failure() {
        AppError::Transport {
            status: upstream.status,
            message: scrub_text(upstream.error_message().unwrap_or("no response received"), secrets),
            body,
            payload,
        }
    } else {
        AppError::Upstream {
            status: upstream.status,
            body,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/prod/mesh/portfolio/", Some("prod")), "/mesh/portfolio");
        assert_eq!(normalize_path("/prod", Some("prod")), "/");
        assert_eq!(normalize_path("/production/x", Some("prod")), "/production/x");
        assert_eq!(normalize_path("/mesh/link-token/", None), "/mesh/link-token");
        assert_eq!(normalize_path("/", None), "/");
        assert_eq!(normalize_path("", None), "/");
    }

    #[test]
    fn test_match_route() {
        assert_eq!(match_route("GET", "/"), Some(RouteKind::Health));
        assert_eq!(match_route("POST", "/mesh/link-token/connect"), Some(RouteKind::Mesh(MeshRoute::LinkToken)));
        assert_eq!(match_route("POST", "/mesh/link-token/pay"), Some(RouteKind::Mesh(MeshRoute::Pay)));
        assert_eq!(match_route("GET", "/mesh/link-token"), None);
        assert_eq!(match_route("DELETE", "/mesh/portfolio"), None);
    }

    #[test]
    fn test_link_token_shape_hoists_token() {
        let body = json!({"content": {"linkToken": "lt-1"}, "status": "ok"});
        let shaped = ResponseShape::LinkToken.apply(body);
        assert_eq!(shaped["linkToken"], "lt-1");

        let passthrough = ResponseShape::Passthrough.apply(json!({"content": {"linkToken": "lt-1"}}));
        assert!(passthrough.get("linkToken").is_none());
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body(None).unwrap().is_empty());
        assert!(parse_body(Some("[1]")).unwrap().is_empty());
        assert!(matches!(parse_body(Some("{oops")), Err(AppError::Validation { .. })));
    }
}
