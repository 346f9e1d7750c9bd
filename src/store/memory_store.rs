use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{ListQuery, MetricStore, Page, StoreError};
use crate::migrations::schema::UNIQUE_RESOURCE_METRIC;
use crate::models::Metric;
use crate::query::{Direction, FieldValue, OrderBy};

/// A process-local store. Rows live in insertion order behind a lock; the
/// uniqueness check and the insert happen under the same write guard.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<Metric>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Read a storage column from a metric.
fn column_value(metric: &Metric, column: &str) -> Option<FieldValue> {
    match column {
        "id" => Some(FieldValue::Text(metric.id.clone())),
        "resource" => Some(FieldValue::Text(metric.resource.clone())),
        "resource_id" => Some(FieldValue::Text(metric.resource_id.clone())),
        "key" => Some(FieldValue::Text(metric.key.clone())),
        "value" => Some(FieldValue::Integer(metric.value)),
        "created_at" => metric.created_at.map(FieldValue::Timestamp),
        _ => None,
    }
}

fn compare(a: &Metric, b: &Metric, order_by: &[OrderBy]) -> Ordering {
    for clause in order_by {
        let lhs = column_value(a, clause.column);
        let rhs = column_value(b, clause.column);
        let ordering = lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal);
        let ordering = match clause.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn create(&self, metric: &Metric) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;

        if rows.iter().any(|m| m.id == metric.id) {
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates primary key: id '{}' already exists",
                metric.id
            )));
        }
        if rows.iter().any(|m| {
            m.resource == metric.resource
                && m.resource_id == metric.resource_id
                && m.key == metric.key
        }) {
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates unique constraint \"{}\"",
                UNIQUE_RESOURCE_METRIC.name
            )));
        }

        let mut row = metric.clone();
        row.created_at = Some(Utc::now().trunc_subsecs(0));
        rows.push(row);
        debug!("Inserted metric {} ({} rows)", metric.id, rows.len());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Metric>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|m| m.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> Result<Page, StoreError> {
        let rows = self.rows.read().await;

        let mut matching: Vec<&Metric> = rows
            .iter()
            .filter(|m| {
                query.conditions.iter().all(|c| {
                    column_value(m, c.column)
                        .map(|actual| c.matches(&actual))
                        .unwrap_or(false)
                })
            })
            .collect();

        let total = query.include_count.then_some(matching.len() as u64);

        if !query.order_by.is_empty() {
            matching.sort_by(|a, b| compare(a, b, &query.order_by));
        }

        let items = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Ok(Page { items, total })
    }

    async fn update(&self, metric: &Metric) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|m| m.id == metric.id) {
            Some(row) => {
                row.value = metric.value;
                Ok(())
            }
            None => Err(StoreError::NotFound(metric.id.clone())),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.rows.write().await.retain(|m| m.id != id);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
