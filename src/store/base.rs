use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::{memory_store::MemoryStore, mongodb_store::MongoDBStore};
use crate::config::StoreConfig;
use crate::models::Metric;
use crate::query::{Condition, OrderBy};

/// Failures reported by a metric store. Messages come from the backend verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),
    /// The targeted row does not exist.
    #[error("metric '{0}' not found")]
    NotFound(String),
    /// Connectivity or any other persistence failure.
    #[error("{0}")]
    Backend(String),
}

/// A filtered, ordered, paginated read of the metrics collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub conditions: Vec<Condition>,
    pub order_by: Vec<OrderBy>,
    pub limit: usize,
    pub offset: usize,
    pub include_count: bool,
}

/// One page of a list query. `total` counts all matches, ignoring the page window.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Metric>,
    pub total: Option<u64>,
}

/// The MetricStore trait abstracts metric persistence (CRUD plus paginated listing).
///
/// Implementations enforce uniqueness of (resource, resource_id, key) and stamp
/// `created_at` on insert.
#[async_trait]
pub trait MetricStore: Send + Sync {
    async fn create(&self, metric: &Metric) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<Option<Metric>, StoreError>;
    async fn list(&self, query: &ListQuery) -> Result<Page, StoreError>;
    /// Persist the mutable part of `metric`, which is only its value.
    async fn update(&self, metric: &Metric) -> Result<(), StoreError>;
    /// Remove a metric. Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    fn backend_name(&self) -> &str;
}

/// Creates a concrete store implementation based on the StoreConfig.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn MetricStore>, StoreError> {
    match config {
        StoreConfig::MongoDB(mongo_config) => {
            let store = MongoDBStore::new(mongo_config).await?;
            info!("Successfully created MongoDB store.");
            Ok(Arc::new(store))
        }
        StoreConfig::Memory => {
            info!("Using in-memory metric store; data is lost on restart.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
