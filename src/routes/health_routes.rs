//! Health check endpoints.

use axum::{
    body::Body,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Registers health check routes.
pub fn routes() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Returns a 200 OK status to indicate the host is running.
async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}
