//! HTTP route definitions and handlers.
//!
//! Plugins contribute their own routers; the host adds health checks and
//! resource discovery on top.

mod health_routes;
pub mod metric_routes;
mod resource_routes;

use crate::plugin::ApiResource;
use axum::Router;

/// Creates the application router.
///
/// Merges the routes contributed by plugins with the host's own endpoints.
pub fn create_router(plugin_routes: Router, resources: Vec<ApiResource>) -> Router {
    Router::new()
        .merge(plugin_routes)
        .merge(resource_routes::routes(resources))
        .merge(health_routes::routes())
}
