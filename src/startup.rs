//! Application startup and server initialization.
//!
//! Builds the metric store, registers and initializes the plugins, then
//! serves the merged router.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::error::PluginError;
use crate::plugin::{MetricsPlugin, PluginHost};
use crate::routes;
use crate::store::{create_store, MetricStore};

/// A host with every built-in plugin registered on top of `store`.
pub fn plugin_host(store: Arc<dyn MetricStore>) -> Result<PluginHost, PluginError> {
    let mut host = PluginHost::new();
    host.register(Box::new(MetricsPlugin::new(store)))?;
    Ok(host)
}

/// Register and initialize the built-in plugins, then build the full router.
pub fn build_app(config: &ConfigV1, store: Arc<dyn MetricStore>) -> Result<Router, PluginError> {
    let mut host = plugin_host(store)?;
    host.initialize(&config.plugins)?;

    let plugin_routes = host.router()?;
    Ok(routes::create_router(plugin_routes, host.api_resources()))
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the store cannot be reached, a plugin rejects its
/// settings, the server fails to bind to the configured address, or the
/// server stops with an I/O error.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&config.store).await?;
    let app = build_app(&config, store)?;

    info!("Starting server on {}", config.bind_address);
    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
