//! Gateway handler
//!
//! Unpacks every HTTP request into an [`InvocationRequest`] and hands it to
//! the dispatcher

use crate::handlers::AppState;
use crate::models::InvocationRequest;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Catch-all handler; routing happens in the dispatcher
pub async fn handle_invocation(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let request = InvocationRequest::new(method.as_str(), uri.path())
        .with_stage(state.settings.server.stage.clone())
        .with_raw_query(uri.query())
        .with_body(String::from_utf8_lossy(&body).into_owned());

    match state.dispatcher.dispatch(request).await {
        Ok(response) => response.into_response(),
        Err(err) => err.into_response(),
    }
}
