use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MetricsConfig;
use crate::error::MetricsError;
use crate::query::{FieldKind, FieldSpec};

/// An integer counter recorded against one resource instance.
///
/// `(resource, resource_id, key)` is unique; the store enforces it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: String,
    pub resource: String,
    pub resource_id: String,
    pub key: String,
    pub value: i64,
    /// Stamped by the store on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Metric {
    /// Public field names accepted in filters and ordering, with their storage columns.
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id", "id", FieldKind::Text),
        FieldSpec::new("resource", "resource", FieldKind::Text),
        FieldSpec::new("resourceId", "resource_id", FieldKind::Text),
        FieldSpec::new("key", "key", FieldKind::Text),
        FieldSpec::new("value", "value", FieldKind::Integer),
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
    ];

    /// Build a new metric from a validated create request, with a fresh id.
    pub fn from_request(request: CreateMetricRequest) -> Self {
        Metric {
            id: Uuid::new_v4().to_string(),
            resource: request.resource,
            resource_id: request.resource_id,
            key: request.key,
            value: request.value,
            created_at: None,
        }
    }
}

/// Payload of `POST /metrics`.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetricRequest {
    pub resource: String,
    pub resource_id: String,
    pub key: String,
    pub value: i64,
}

impl CreateMetricRequest {
    /// Validate against the configured bounds. Trims `key` in place.
    pub fn validate(&mut self, config: &MetricsConfig) -> Result<(), MetricsError> {
        if !config.is_allowed_type(&self.resource) {
            return Err(MetricsError::validation("resource type is not allowed"));
        }

        if Uuid::parse_str(&self.resource_id).is_err() {
            return Err(MetricsError::validation("resourceId must be a valid UUID"));
        }

        self.key = self.key.trim().to_string();
        if self.key.is_empty() {
            return Err(MetricsError::validation("key cannot be empty"));
        }

        if self.key.chars().count() > config.max_key_length {
            return Err(MetricsError::validation("key exceeds maximum length"));
        }

        check_sign(self.value, config)
    }
}

/// Payload of `PUT /metrics/{id}`. Only the value can change.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct UpdateMetricRequest {
    pub value: i64,
}

impl UpdateMetricRequest {
    pub fn validate(&self, config: &MetricsConfig) -> Result<(), MetricsError> {
        check_sign(self.value, config)
    }
}

fn check_sign(value: i64, config: &MetricsConfig) -> Result<(), MetricsError> {
    if config.only_positive_values && value < 0 {
        return Err(MetricsError::validation("value must be positive"));
    }
    Ok(())
}
