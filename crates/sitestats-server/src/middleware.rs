//! Middleware for the REST API server.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Create CORS middleware.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Request logging middleware.
///
/// Server errors are logged at warn level, everything else at info.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(method = %method, path = %path, status, duration_ms, "Request failed");
    } else {
        info!(method = %method, path = %path, status, duration_ms, "Request completed");
    }

    response
}
