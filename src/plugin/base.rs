use axum::Router;
use schemars::schema::RootSchema;
use serde::Serialize;

use crate::error::PluginError;
use crate::migrations::MigrationSource;

/// Describes one resource for API documentation and discovery.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResource {
    pub name: String,
    pub plural_name: String,
    pub base_path: String,
    pub tags: Vec<String>,
    pub description: String,
    pub response_model: RootSchema,
    pub create_model: RootSchema,
    pub update_model: RootSchema,
}

/// The ResourcePlugin trait is what the host drives to mount a resource.
///
/// The host calls `initialize` once with the plugin's settings section, then
/// `setup_endpoints` to collect its routes.
pub trait ResourcePlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Names of plugins that must be initialized before this one.
    fn dependencies(&self) -> Vec<String>;

    fn initialize(&mut self, settings: serde_json::Value) -> Result<(), PluginError>;

    fn setup_endpoints(&mut self) -> Result<Router, PluginError>;

    fn migration_source(&self) -> MigrationSource;

    /// Migration sources that must be applied before this plugin's own.
    fn migration_dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    fn api_resources(&self) -> Vec<ApiResource> {
        Vec::new()
    }
}
