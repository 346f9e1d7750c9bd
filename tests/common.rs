#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use resource_metrics::config::{load_from_str, ConfigV1};
use resource_metrics::startup::build_app;
use resource_metrics::store::memory_store::MemoryStore;
use serde_json::Value;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:8081
logging:
  level: "debug"
  format: "json"
store:
  type: memory
plugins:
  metrics:
    allowed_types:
      - post
      - user
    only_positive_values: true
    pagination_limit: 2
    max_pagination_limit: 5
"#;

pub const RESOURCE_ID: &str = "6f1c1f0e-8b5a-4c1a-9d1e-2b7f4a3c9e10";

pub fn load_test_config() -> ConfigV1 {
    load_from_str(TEST_CONFIG).expect("Failed to parse test config YAML")
}

pub fn build_test_app(config: &ConfigV1) -> Router {
    build_app(config, Arc::new(MemoryStore::new())).expect("plugins should initialize")
}

pub fn json_request(method: Method, path: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(path);
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request")
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
