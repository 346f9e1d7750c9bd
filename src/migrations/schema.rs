//! Dialect-independent description of the metrics table.

pub const METRICS_TABLE: &str = "metrics";

/// An index over one or more columns of the metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

/// The uniqueness constraint on (resource, resource_id, key).
pub const UNIQUE_RESOURCE_METRIC: IndexSpec = IndexSpec {
    name: "unique_resource_metric",
    columns: &["resource", "resource_id", "key"],
    unique: true,
};

/// Secondary indexes, in creation order.
pub const SECONDARY_INDEXES: &[IndexSpec] = &[
    IndexSpec {
        name: "idx_metrics_resource",
        columns: &["resource", "resource_id", "key"],
        unique: false,
    },
    IndexSpec {
        name: "idx_metrics_key",
        columns: &["key", "created_at"],
        unique: false,
    },
    IndexSpec {
        name: "idx_metrics_resource_id",
        columns: &["resource_id"],
        unique: false,
    },
];
