//! Logging middleware
//!
//! Wraps every invocation in a span carrying a request id and records the
//! outcome

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Request logging middleware
///
/// Query strings are left out of the span; they may carry auth tokens.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "invocation",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        info!("Request started: {} {}", method, path);

        let response = next.run(request).await;

        let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        let status = response.status();

        if status.is_client_error() {
            warn!("Client error: {} - Duration: {:.2}ms", status, duration_ms);
        } else if status.is_server_error() {
            warn!("Server error: {} - Duration: {:.2}ms", status, duration_ms);
        } else {
            info!("Request completed: {} - Duration: {:.2}ms", status, duration_ms);
        }

        response
    }
    .instrument(span)
    .await
}
