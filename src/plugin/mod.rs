pub mod base;
pub mod host;
pub mod metrics_plugin;

pub use base::{ApiResource, ResourcePlugin};
pub use host::PluginHost;
pub use metrics_plugin::MetricsPlugin;
