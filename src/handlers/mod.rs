//! HTTP handlers module
//!
//! Wires the axum router, middleware and shared application state

pub mod gateway;

use crate::config::Settings;
use crate::middleware::{json_envelope_middleware, request_logging_middleware};
use crate::secrets::{build_secret_store, SecretLoader, SecretStore};
use crate::services::{Dispatcher, UpstreamClient};
use anyhow::Result;
use axum::{extract::DefaultBodyLimit, middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Application state
///
/// Built once at start-up; invocations only read it.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub dispatcher: Dispatcher,
}

/// Create application router with the secret store selected by the settings
pub async fn create_router(settings: Settings) -> Result<Router> {
    let store = build_secret_store(&settings.secrets).await;
    create_router_with_store(settings, store)
}

/// Create application router over an explicit secret store
pub fn create_router_with_store(settings: Settings, store: Arc<dyn SecretStore>) -> Result<Router> {
    let client = UpstreamClient::new(settings.upstream.timeout)?;
    let loader = SecretLoader::new(store, settings.secrets.secret_name.clone());

    let app_state = Arc::new(AppState {
        dispatcher: Dispatcher::new(loader, client),
        settings: settings.clone(),
    });

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(settings.request.max_request_size));

    let router = Router::new()
        .fallback(gateway::handle_invocation)
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(app_state)
        .layer(middleware_stack)
        .layer(middleware::map_response(json_envelope_middleware));

    Ok(router)
}
