//! Shared handler state.
//!
//! Contains what the metric handlers need: the validated configuration and
//! the metric store.

use crate::config::MetricsConfig;
use crate::store::MetricStore;
use std::sync::Arc;

/// State shared across all metric handlers.
///
/// Cloned for each request; the configuration is read-only once the plugin
/// has been initialized.
#[derive(Clone)]
pub struct MetricState {
    /// Validation bounds and allow-list.
    pub config: Arc<MetricsConfig>,
    /// Storage backend for metric rows.
    pub store: Arc<dyn MetricStore>,
}
