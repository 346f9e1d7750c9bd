//! Discovery endpoint listing the resources exposed by the registered plugins.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::plugin::ApiResource;

/// Registers `GET /api/resources`.
pub fn routes(resources: Vec<ApiResource>) -> Router {
    Router::new()
        .route("/api/resources", get(list_resources))
        .with_state(Arc::new(resources))
}

async fn list_resources(State(resources): State<Arc<Vec<ApiResource>>>) -> Json<Vec<ApiResource>> {
    Json(resources.as_ref().clone())
}
