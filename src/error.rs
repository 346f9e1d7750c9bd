//! Error types shared across the crate.

use thiserror::Error;

use crate::store::StoreError;

/// An invalid configuration bound. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        ConfigError(message.into())
    }
}

/// Errors produced while serving metric requests.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Bad payload or query input; the message names the violated rule.
    #[error("{0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for MetricsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => MetricsError::NotFound,
            other => MetricsError::Storage(other),
        }
    }
}

impl MetricsError {
    pub fn validation(message: impl Into<String>) -> Self {
        MetricsError::Validation(message.into())
    }
}

/// Errors raised while registering, initializing or wiring plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid configuration for plugin '{plugin}': {source}")]
    Config {
        plugin: String,
        #[source]
        source: ConfigError,
    },
    #[error("invalid settings for plugin '{plugin}': {message}")]
    InvalidSettings { plugin: String, message: String },
    #[error("plugin '{0}' has not been initialized")]
    NotInitialized(String),
    #[error("plugin '{0}' is already registered")]
    DuplicatePlugin(String),
    #[error("plugin '{plugin}' depends on '{dependency}', which is not registered")]
    MissingDependency { plugin: String, dependency: String },
    #[error("dependency cycle detected involving plugin '{0}'")]
    DependencyCycle(String),
}
