//! sitestats-server - REST API server for sitestats.
//!
//! This crate exposes the versioned site catalog over HTTP.
//!
//! # Example
//!
//! ```ignore
//! use sitestats_server::{create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::open(StoreConfig::from_env()).unwrap();
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, RetryPolicy};

use axum::{middleware as axum_middleware, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state).layer(
        ServiceBuilder::new()
            .layer(axum_middleware::from_fn(middleware::logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::cors_layer()),
    )
}
