use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ListQuery, MetricStore, Page, StoreError};
use crate::migrations::schema::{IndexSpec, METRICS_TABLE, SECONDARY_INDEXES, UNIQUE_RESOURCE_METRIC};
use crate::models::Metric;
use crate::query::{Condition, Direction, FieldValue, OrderBy, Operator};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// The config struct for MongoDB connections.
/// Contains the URI and database name.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct MongoDBConfig {
    pub uri: String,
    pub database: String,
}

/// A `MetricStore` backed by a single MongoDB collection named `metrics`.
pub struct MongoDBStore {
    collection: Collection<MetricDocument>,
}

/// Document shape for storing metrics in MongoDB.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct MetricDocument {
    #[serde(rename = "_id")]
    id: String,
    resource: String,
    resource_id: String,
    key: String,
    value: i64,
    created_at: BsonDateTime,
}

impl MongoDBStore {
    /// Connects to MongoDB and makes sure the collection indexes exist.
    pub async fn new(config: &MongoDBConfig) -> Result<Self, StoreError> {
        info!("Connecting to MongoDB at URI: {}", config.uri);

        let mut client_options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to parse MongoDB URI: {}", e)))?;
        client_options.app_name = Some("resource-metrics".to_string());

        let client = Client::with_options(client_options)
            .map_err(|e| StoreError::Backend(format!("Failed to create MongoDB client: {}", e)))?;

        let collection = client
            .database(&config.database)
            .collection::<MetricDocument>(METRICS_TABLE);

        let store = Self { collection };
        store.ensure_indexes().await?;
        info!("MongoDB connection established successfully.");
        Ok(store)
    }

    /// Creates the unique (resource, resource_id, key) index and the secondary indexes.
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        for index in std::iter::once(&UNIQUE_RESOURCE_METRIC).chain(SECONDARY_INDEXES) {
            debug!("Ensuring index {} on {:?}", index.name, index.columns);
            self.collection
                .create_index(Self::index_model(index), None)
                .await
                .map_err(|e| {
                    StoreError::Backend(format!("Failed to create index {}: {}", index.name, e))
                })?;
        }
        Ok(())
    }

    fn index_model(index: &IndexSpec) -> IndexModel {
        let mut keys = Document::new();
        for column in index.columns {
            keys.insert(*column, 1);
        }

        IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(index.name.to_string())
                    .unique(index.unique)
                    .build(),
            )
            .build()
    }

    /// Convert a `Metric` to a `MetricDocument`, stamping the creation time.
    fn metric_to_doc(metric: &Metric) -> MetricDocument {
        MetricDocument {
            id: metric.id.clone(),
            resource: metric.resource.clone(),
            resource_id: metric.resource_id.clone(),
            key: metric.key.clone(),
            value: metric.value,
            created_at: BsonDateTime::now(),
        }
    }

    /// Convert a `MetricDocument` back into a `Metric`.
    fn doc_to_metric(doc: MetricDocument) -> Metric {
        Metric {
            id: doc.id,
            resource: doc.resource,
            resource_id: doc.resource_id,
            key: doc.key,
            value: doc.value,
            created_at: chrono::DateTime::<Utc>::from_timestamp_millis(
                doc.created_at.timestamp_millis(),
            ),
        }
    }

    fn field_name(column: &str) -> &str {
        match column {
            "id" => "_id",
            other => other,
        }
    }

    fn value_to_bson(value: &FieldValue) -> Bson {
        match value {
            FieldValue::Text(s) => Bson::String(s.clone()),
            FieldValue::Integer(i) => Bson::Int64(*i),
            FieldValue::Timestamp(t) => {
                Bson::DateTime(BsonDateTime::from_millis(t.timestamp_millis()))
            }
        }
    }

    fn condition_to_doc(condition: &Condition) -> Document {
        let field = Self::field_name(condition.column);
        let mut values: Vec<Bson> = condition.values.iter().map(Self::value_to_bson).collect();

        let mut filter = Document::new();
        if condition.op == Operator::Eq && values.len() == 1 {
            filter.insert(field, values.remove(0));
            return filter;
        }

        let mut comparison = Document::new();
        match condition.op {
            Operator::Eq => {
                comparison.insert("$in", values);
            }
            Operator::Ne => {
                comparison.insert("$nin", values);
            }
            op => {
                let name = match op {
                    Operator::Gt => "$gt",
                    Operator::Gte => "$gte",
                    Operator::Lt => "$lt",
                    _ => "$lte",
                };
                comparison.insert(name, values.into_iter().next().unwrap_or(Bson::Null));
            }
        }
        filter.insert(field, comparison);
        filter
    }

    fn filter_doc(conditions: &[Condition]) -> Document {
        if conditions.is_empty() {
            return Document::new();
        }
        let clauses: Vec<Document> = conditions.iter().map(Self::condition_to_doc).collect();
        doc! { "$and": clauses }
    }

    fn sort_doc(order_by: &[OrderBy]) -> Option<Document> {
        if order_by.is_empty() {
            return None;
        }
        let mut sort = Document::new();
        for clause in order_by {
            let direction = match clause.direction {
                Direction::Asc => 1,
                Direction::Desc => -1,
            };
            sort.insert(Self::field_name(clause.column), direction);
        }
        Some(sort)
    }

    fn insert_error(e: MongoError) -> StoreError {
        match e.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY => {
                StoreError::Conflict(we.message.clone())
            }
            _ => Self::backend_error(e),
        }
    }

    /// Request-path failures carry the driver's message unchanged.
    fn backend_error(e: MongoError) -> StoreError {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
impl MetricStore for MongoDBStore {
    async fn create(&self, metric: &Metric) -> Result<(), StoreError> {
        self.collection
            .insert_one(Self::metric_to_doc(metric), None)
            .await
            .map_err(Self::insert_error)?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Metric>, StoreError> {
        let found = self
            .collection
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(Self::backend_error)?;
        Ok(found.map(Self::doc_to_metric))
    }

    async fn list(&self, query: &ListQuery) -> Result<Page, StoreError> {
        let filter = Self::filter_doc(&query.conditions);

        let total = if query.include_count {
            let count = self
                .collection
                .count_documents(filter.clone(), None)
                .await
                .map_err(Self::backend_error)?;
            Some(count)
        } else {
            None
        };

        let options = FindOptions::builder()
            .sort(Self::sort_doc(&query.order_by))
            .skip(query.offset as u64)
            .limit(query.limit as i64)
            .build();

        let mut cursor = self
            .collection
            .find(filter, options)
            .await
            .map_err(Self::backend_error)?;

        let mut items = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(Self::backend_error)?
        {
            items.push(Self::doc_to_metric(doc));
        }

        Ok(Page { items, total })
    }

    async fn update(&self, metric: &Metric) -> Result<(), StoreError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": &metric.id },
                doc! { "$set": { "value": metric.value } },
                None,
            )
            .await
            .map_err(Self::backend_error)?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(metric.id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.collection
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(Self::backend_error)?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "mongo"
    }
}
