mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use axum::Router;
use common::{json_request, load_test_config, read_json, RESOURCE_ID};
use resource_metrics::models::Metric;
use resource_metrics::startup::build_app;
use resource_metrics::store::memory_store::MemoryStore;
use resource_metrics::store::{ListQuery, MetricStore, Page, StoreError};
use serde_json::json;
use tower::ServiceExt;

/// Delegates to an in-memory store unless an operation is set to fail.
#[derive(Default)]
struct FailingStore {
    inner: MemoryStore,
    create: Option<&'static str>,
    get: Option<&'static str>,
    get_nothing: bool,
    list: Option<&'static str>,
    update: Option<&'static str>,
    delete: Option<&'static str>,
}

fn fail(message: Option<&'static str>) -> Result<(), StoreError> {
    match message {
        Some(m) => Err(StoreError::Backend(m.to_string())),
        None => Ok(()),
    }
}

#[async_trait]
impl MetricStore for FailingStore {
    async fn create(&self, metric: &Metric) -> Result<(), StoreError> {
        fail(self.create)?;
        self.inner.create(metric).await
    }

    async fn get(&self, id: &str) -> Result<Option<Metric>, StoreError> {
        fail(self.get)?;
        if self.get_nothing {
            return Ok(None);
        }
        self.inner.get(id).await
    }

    async fn list(&self, query: &ListQuery) -> Result<Page, StoreError> {
        fail(self.list)?;
        self.inner.list(query).await
    }

    async fn update(&self, metric: &Metric) -> Result<(), StoreError> {
        fail(self.update)?;
        self.inner.update(metric).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        fail(self.delete)?;
        self.inner.delete(id).await
    }

    fn backend_name(&self) -> &str {
        "failing"
    }
}

fn app_with(store: FailingStore) -> Router {
    build_app(&load_test_config(), Arc::new(store)).expect("plugins should initialize")
}

fn new_metric() -> serde_json::Value {
    json!({"resource": "post", "resourceId": RESOURCE_ID, "key": " views ", "value": 7})
}

#[tokio::test]
async fn integration_create_falls_back_when_reread_fails() {
    let app = app_with(FailingStore {
        get: Some("read down"),
        ..FailingStore::default()
    });

    let response = app
        .oneshot(json_request(Method::POST, "/metrics", Some(new_metric())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = read_json(response).await;
    assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(created["resource"], "post");
    assert_eq!(created["resourceId"], RESOURCE_ID);
    assert_eq!(created["key"], "views");
    assert_eq!(created["value"], 7);
    assert!(created.get("createdAt").is_none());
}

#[tokio::test]
async fn integration_create_falls_back_when_reread_finds_nothing() {
    let app = app_with(FailingStore {
        get_nothing: true,
        ..FailingStore::default()
    });

    let response = app
        .oneshot(json_request(Method::POST, "/metrics", Some(new_metric())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json(response).await["key"], "views");
}

#[tokio::test]
async fn integration_storage_failures_are_500_with_backend_message() {
    let app = app_with(FailingStore {
        list: Some("list down"),
        update: Some("update down"),
        delete: Some("del down"),
        ..FailingStore::default()
    });

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/metrics", Some(new_metric())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let path = format!("/metrics/{}", read_json(response).await["id"].as_str().unwrap());

    let cases = [
        (json_request(Method::GET, "/metrics", None), "list down"),
        (
            json_request(Method::PUT, &path, Some(json!({"value": 9}))),
            "update down",
        ),
        (json_request(Method::DELETE, &path, None), "del down"),
    ];
    for (request, message) in cases {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await, json!({ "error": message }));
    }
}

#[tokio::test]
async fn integration_failed_insert_and_read_are_500() {
    let app = app_with(FailingStore {
        create: Some("insert down"),
        get: Some("read down"),
        ..FailingStore::default()
    });

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/metrics", Some(new_metric())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await, json!({"error": "insert down"}));

    let response = app
        .oneshot(json_request(Method::GET, "/metrics/some-id", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await, json!({"error": "read down"}));
}

#[tokio::test]
async fn integration_update_of_unreadable_row_is_404() {
    let app = app_with(FailingStore {
        get_nothing: true,
        ..FailingStore::default()
    });

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/metrics", Some(new_metric())))
        .await
        .unwrap();
    let path = format!("/metrics/{}", read_json(response).await["id"].as_str().unwrap());

    let response = app
        .oneshot(json_request(Method::PUT, &path, Some(json!({"value": 9}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await, json!({"error": "Not found"}));
}
