use std::collections::HashMap;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: where to listen, how to log, where to store metrics,
/// and one settings section per resource plugin (keyed by plugin name).
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub plugins: HashMap<String, serde_json::Value>,
}

fn extract(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load config from "config.yaml" in the current directory, with
/// `RESOURCE_METRICS_*` environment variables taking precedence
/// (nested keys separated by `__`).
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::prefixed("RESOURCE_METRICS_").split("__"));
    match extract(figment) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Parse a configuration from a YAML string.
pub fn load_from_str(yaml: &str) -> Result<ConfigV1, figment::Error> {
    extract(Figment::new().merge(Yaml::string(yaml)))
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to render configuration schema: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;

    const CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: debug
  format: json
store:
  type: mongo
  uri: mongodb://localhost:27017
  database: metrics
plugins:
  metrics:
    allowed_types: [post, user]
    only_positive_values: true
"#;

    #[test]
    fn test_load_full_config() {
        let config = load_from_str(CONFIG).expect("config should parse");
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.service_name, "resource-metrics");
        match &config.store {
            StoreConfig::MongoDB(mongo) => assert_eq!(mongo.database, "metrics"),
            other => panic!("unexpected store config: {:?}", other),
        }

        let settings = config.plugins.get("metrics").cloned().unwrap();
        let metrics: MetricsConfig = serde_json::from_value(settings).unwrap();
        assert_eq!(metrics.allowed_types, vec!["post", "user"]);
        assert!(metrics.only_positive_values);
        assert_eq!(metrics.max_pagination_limit, 200);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_from_str(
            r#"
version: "1.0.0"
bind_address: 0.0.0.0:3000
store:
  type: memory
"#,
        )
        .expect("config should parse");
        assert!(matches!(config.store, StoreConfig::Memory));
        assert_eq!(config.logging.format, "console");
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let result = load_from_str(
            r#"
version: "2.0.0"
bind_address: 0.0.0.0:3000
store:
  type: memory
"#,
        );
        assert!(result.is_err());
    }
}
