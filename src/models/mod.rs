pub mod metric;

pub use metric::{CreateMetricRequest, Metric, UpdateMetricRequest};
