//! The metrics resource as a host plugin.

use std::sync::Arc;

use axum::Router;
use schemars::schema_for;
use serde_json::Value;
use tracing::info;

use super::base::{ApiResource, ResourcePlugin};
use crate::config::MetricsConfig;
use crate::error::PluginError;
use crate::migrations::{metrics_migrations, MigrationSource};
use crate::models::{CreateMetricRequest, Metric, UpdateMetricRequest};
use crate::routes::metric_routes;
use crate::state::MetricState;
use crate::store::MetricStore;

pub const PLUGIN_NAME: &str = "metrics";

enum Lifecycle {
    Uninitialized,
    Initialized(Arc<MetricsConfig>),
    EndpointsRegistered(Arc<MetricsConfig>),
}

pub struct MetricsPlugin {
    store: Arc<dyn MetricStore>,
    lifecycle: Lifecycle,
}

impl MetricsPlugin {
    pub fn new(store: Arc<dyn MetricStore>) -> Self {
        MetricsPlugin {
            store,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    /// The active configuration, once initialized.
    pub fn config(&self) -> Option<&MetricsConfig> {
        match &self.lifecycle {
            Lifecycle::Uninitialized => None,
            Lifecycle::Initialized(c) | Lifecycle::EndpointsRegistered(c) => Some(c.as_ref()),
        }
    }

    fn decode_settings(settings: Value) -> Result<MetricsConfig, PluginError> {
        if settings.is_null() {
            return Ok(MetricsConfig::default());
        }
        serde_json::from_value(settings).map_err(|e| PluginError::InvalidSettings {
            plugin: PLUGIN_NAME.to_string(),
            message: e.to_string(),
        })
    }
}

impl ResourcePlugin for MetricsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    fn initialize(&mut self, settings: Value) -> Result<(), PluginError> {
        let config = Self::decode_settings(settings)?;
        config.validate().map_err(|source| PluginError::Config {
            plugin: PLUGIN_NAME.to_string(),
            source,
        })?;

        info!(
            "Metrics plugin ready (allowed types: {}, store: {})",
            config.allowed_types.join(", "),
            self.store.backend_name()
        );
        self.lifecycle = Lifecycle::Initialized(Arc::new(config));
        Ok(())
    }

    fn setup_endpoints(&mut self) -> Result<Router, PluginError> {
        let config = match &self.lifecycle {
            Lifecycle::Uninitialized => {
                return Err(PluginError::NotInitialized(PLUGIN_NAME.to_string()))
            }
            Lifecycle::Initialized(c) | Lifecycle::EndpointsRegistered(c) => c.clone(),
        };

        let state = MetricState {
            config: config.clone(),
            store: self.store.clone(),
        };
        self.lifecycle = Lifecycle::EndpointsRegistered(config);
        Ok(metric_routes::routes().with_state(state))
    }

    fn migration_source(&self) -> MigrationSource {
        metrics_migrations()
    }

    fn api_resources(&self) -> Vec<ApiResource> {
        vec![ApiResource {
            name: "metric".to_string(),
            plural_name: "metrics".to_string(),
            base_path: "/metrics".to_string(),
            tags: vec!["Metrics".to_string()],
            description: "Integer counters keyed per resource instance".to_string(),
            response_model: schema_for!(Metric),
            create_model: schema_for!(CreateMetricRequest),
            update_model: schema_for!(UpdateMetricRequest),
        }]
    }
}
